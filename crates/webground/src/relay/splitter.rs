use crate::models::stream::Delta;

pub const THINK_OPEN: &str = "<think>";
pub const THINK_CLOSE: &str = "</think>";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SplitMode {
    #[default]
    Answering,
    Thinking,
}

/// Separates a model's visible answer from its reasoning.
///
/// The splitter is a value: [`TokenSplitter::apply`] consumes it and returns
/// the next state, so replaying the same deltas always ends in the same buffers.
/// Reasoning arrives either inline between `<think>` markers or in the
/// dedicated `reasoning_content` field; both land in the think buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSplitter {
    mode: SplitMode,
    answer: String,
    think: String,
}

impl TokenSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(mut self, delta: &Delta) -> Self {
        let token = delta.content.as_deref().unwrap_or_default();
        let reasoning = delta.reasoning_content.as_deref().unwrap_or_default();

        // Markers switch mode and are never shown
        if token.contains(THINK_OPEN) {
            self.mode = SplitMode::Thinking;
            return self;
        }
        if token.contains(THINK_CLOSE) {
            self.mode = SplitMode::Answering;
            return self;
        }

        if self.mode == SplitMode::Thinking || !reasoning.is_empty() {
            self.think
                .push_str(if token.is_empty() { reasoning } else { token });
        } else {
            self.answer.push_str(token);
        }
        self
    }

    /// Fold a whole sequence of deltas
    pub fn apply_all<'a, I>(self, deltas: I) -> Self
    where
        I: IntoIterator<Item = &'a Delta>,
    {
        deltas.into_iter().fold(self, |state, delta| state.apply(delta))
    }

    pub fn mode(&self) -> SplitMode {
        self.mode
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn think(&self) -> &str {
        &self.think
    }
}
