use eframe::egui::{self, Color32, Image};
use overlay_server::ConnectionState;
use tokio::sync::broadcast;

use crate::bus::UiEvent;
use crate::startup::FrontendHandle;

pub fn run_gui(frontend: FrontendHandle) -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_transparent(true)
            .with_inner_size([480.0, 640.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Overlay Viewer",
        options,
        Box::new(|_cc| Ok(Box::new(ViewerApp::new(frontend)))),
    )
}

#[derive(Default)]
pub struct AppState {
    pub recent_comments: Vec<(String, String)>,
}

impl AppState {
    pub fn push_comment(&mut self, user: String, text: String) {
        self.recent_comments.push((user, text));
        if self.recent_comments.len() > 50 {
            self.recent_comments.remove(0);
        }
    }
}

pub struct ViewerApp {
    state: AppState,
    frontend: FrontendHandle,
    composite_tex: Option<egui::TextureHandle>,
}

impl ViewerApp {
    pub fn new(frontend: FrontendHandle) -> Self {
        Self {
            state: AppState::default(),
            frontend,
            composite_tex: None,
        }
    }

    fn poll_events(&mut self) {
        loop {
            match self.frontend.ui_rx.try_recv() {
                Ok(UiEvent::NewComment { user, text }) => {
                    self.state.push_comment(user, text);
                }
                Ok(UiEvent::Cleared) => {
                    self.state.recent_comments.clear();
                }
                Err(broadcast::error::TryRecvError::Empty) => break,
                Err(_) => break,
            }
        }
    }

    // one animation frame: consume the lip level, advance the blink, and
    // recomposite only when something changed
    fn tick_avatar(&mut self, ctx: &egui::Context) {
        let Ok(avatar) = &mut self.frontend.avatar else {
            return;
        };

        let lip = *self.frontend.lip_rx.borrow();
        let mouth = if avatar.preview && lip == 0 {
            None
        } else {
            Some(lip)
        };
        avatar.renderer.set_mouth_level(mouth);

        let eye = if avatar.preview {
            None
        } else {
            Some(avatar.blink.tick())
        };
        avatar.renderer.set_eye_level(eye);

        if avatar.renderer.take_pending() {
            let frame = avatar.renderer.draw();
            let color_image = rgba_image_to_color_image(&frame);
            self.composite_tex =
                Some(ctx.load_texture("composited", color_image, egui::TextureOptions::LINEAR));
        }
    }

    fn connection_label(&self) -> (&'static str, Color32) {
        match *self.frontend.state_rx.borrow() {
            ConnectionState::Disconnected => ("disconnected", Color32::GRAY),
            ConnectionState::Connecting => ("connecting...", Color32::YELLOW),
            ConnectionState::Connected => ("connected", Color32::GREEN),
            ConnectionState::Error => ("connection error", Color32::RED),
        }
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_events();
        self.tick_avatar(ctx);

        egui::CentralPanel::default()
            .frame(egui::Frame::default().fill(Color32::TRANSPARENT))
            .show(ctx, |ui| {
                let (label, color) = self.connection_label();
                ui.colored_label(color, label);

                if let Err(err) = &self.frontend.avatar {
                    ui.colored_label(Color32::RED, format!("Failed to load avatar: {err}"));
                } else if let Some(tex) = &self.composite_tex {
                    ui.add(Image::new(tex).fit_to_exact_size(ui.available_size_before_wrap() * 0.8));
                }

                for (user, text) in self.state.recent_comments.iter().rev().take(8) {
                    ui.label(format!("{user}: {text}"));
                }
            });

        ctx.request_repaint();
    }

    fn clear_color(&self, _visuals: &egui::Visuals) -> [f32; 4] {
        [0.0, 0.0, 0.0, 0.0]
    }
}

fn rgba_image_to_color_image(img: &image::RgbaImage) -> egui::ColorImage {
    let (w, h) = img.dimensions();
    let raw = img.as_raw();
    egui::ColorImage::from_rgba_unmultiplied([w as usize, h as usize], raw)
}
