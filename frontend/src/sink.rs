use crate::models::ChatRole;

/// Where chat messages are rendered. Keeps the clients independent of the DOM.
pub trait MessageSink {
    /// Refers to one rendered message so that text can be appended later.
    type Handle;

    /// Appends a new message to the view, scrolls to it and returns its handle.
    fn create(&self, role: ChatRole, text: &str) -> Self::Handle;

    fn append(&self, handle: &Self::Handle, text: &str);

    fn scroll_to_latest(&self);
}
