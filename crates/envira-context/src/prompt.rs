//! Prompt assembly around a rendered context window

use crate::window::Window;

/// Medical-assistant persona used for the chat page.
pub const MEDICAL_ASSISTANT_INSTRUCTION: &str = "You are MediAssist, a helpful medical AI assistant. \
You provide general health information and guidance, but always remind users to consult with \
healthcare professionals for serious concerns. You are knowledgeable about symptoms, general health \
advice, medications (general information), and healthy lifestyle recommendations. Always be \
empathetic, professional, and clear that you cannot replace professional medical diagnosis or treatment.";

const QUESTION_PREFIX: &str = "User question: ";

/// Joins a fixed system instruction, prior history and the new message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptAssembler {
    system_instruction: String,
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self::new(MEDICAL_ASSISTANT_INSTRUCTION)
    }
}

impl PromptAssembler {
    pub fn new(system_instruction: impl Into<String>) -> Self {
        Self {
            system_instruction: system_instruction.into(),
        }
    }

    pub fn assemble(&self, window: &Window<'_>, message: &str) -> String {
        let history = window.render();
        let mut prompt = String::with_capacity(
            self.system_instruction.len()
                + history.len()
                + QUESTION_PREFIX.len()
                + message.len()
                + 2,
        );
        prompt.push_str(&self.system_instruction);
        prompt.push_str("\n\n");
        prompt.push_str(&history);
        prompt.push_str(QUESTION_PREFIX);
        prompt.push_str(message);
        prompt
    }
}
