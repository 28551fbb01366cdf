/// Events the window cares about, fanned in from the overlay hub.
#[derive(Debug, Clone)]
pub enum UiEvent {
    NewComment { user: String, text: String },
    /// The stream reconnected; drop the local comment list.
    Cleared,
}
