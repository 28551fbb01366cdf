use std::{fs::File, path::PathBuf};

use clap::{CommandFactory, Parser};
use layer_stage::{AvatarConfig, AvatarRenderer, LayerDocument, resolve_sequence};

use crate::cli::Cli;

mod cli;

pub fn run() -> anyhow::Result<()> {
    // parse command
    let args = Cli::parse();

    match args.command {
        Some(cli::Commands::Info { document }) => {
            info(&document)?;
        }
        Some(cli::Commands::Render {
            document,
            output,
            config,
            mouth_level,
            eye_level,
        }) => {
            render(&document, &output, &config, mouth_level, eye_level)?;
        }
        None => {
            Cli::command().print_long_help()?;
        }
    }

    Ok(())
}

fn info(document: &PathBuf) -> anyhow::Result<()> {
    let document = LayerDocument::from_reader(File::open(document)?)?;

    println!("{}x{}", document.width, document.height);
    for layer in &document.layers {
        let mut flags = Vec::new();
        if layer.is_group {
            flags.push("group");
        }
        if layer.force_visible {
            flags.push("force-visible");
        }
        if layer.is_radio {
            flags.push("radio");
        }
        if layer.mirror_x {
            flags.push("flip-x");
        }
        if layer.mirror_y {
            flags.push("flip-y");
        }
        if layer.hidden {
            flags.push("hidden");
        }
        println!("{} ({}) [{}]", layer.path, layer.display_name, flags.join(", "));
    }

    Ok(())
}

fn render(
    document: &PathBuf,
    output: &PathBuf,
    config: &str,
    mouth_level: Option<u8>,
    eye_level: Option<u8>,
) -> anyhow::Result<()> {
    let document = LayerDocument::from_reader(File::open(document)?)?;
    let config = AvatarConfig::from_query(config);

    let mouth = config.mouth_assignment();
    let eye = config.eye_assignment();
    let sequence = resolve_sequence(&document, &mouth, &eye, &config.resolve_options());

    let mut renderer = AvatarRenderer::new(sequence, &mouth, &eye, config.preview);
    if let Some(level) = mouth_level {
        renderer.set_mouth_level(Some(level));
    }
    if let Some(level) = eye_level {
        renderer.set_eye_level(Some(level));
    }

    let frame = renderer.draw();
    frame.save(output)?;
    println!("Success!");

    Ok(())
}
