/// Where status-line text goes. The engine never renders anything
/// itself; hosts drain the log (or provide their own sink).
pub trait MessageSink {
    fn show_status(&mut self, message: &str);
}

/// Default sink: collects messages for the host to display.
#[derive(Debug, Default, Clone)]
pub struct MessageLog {
    messages: Vec<String>,
}

impl MessageLog {
    pub fn show(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    /// The most recent status message.
    pub fn last(&self) -> Option<&str> {
        self.messages.last().map(|s| s.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().map(|s| s.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn drain(&mut self) -> Vec<String> {
        std::mem::take(&mut self.messages)
    }
}

impl MessageSink for MessageLog {
    fn show_status(&mut self, message: &str) {
        self.show(message);
    }
}
