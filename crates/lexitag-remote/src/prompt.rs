//! Instruction template for remote tagging

use lexitag_extractor::TagVocabulary;

/// Builds the markup request sent for one assistant turn
#[derive(Debug, Clone)]
pub struct MarkupPrompt {
    preamble: String,
}

impl MarkupPrompt {
    pub fn new(vocabulary: &TagVocabulary) -> Self {
        let language = vocabulary.language();
        let preamble = format!(
            "You are an expert in natural language processing and text markup. \
Your task is to add special XML tags to the text below, which contains information about words in {language}.\n\
\n\
Add the following XML tags to the text:\n\
{tags}\n\
\n\
Rules:\n\
1. Preserve the format and original structure of the text\n\
2. Do not add or remove information\n\
3. Apply the tags consistently and accurately\n\
4. Ensure that all tags are correctly closed\n\
5. Do not use nested tags of the same type\n\
\n\
Here is the text to mark:\n\
\n",
            tags = vocabulary.describe(),
        );

        Self { preamble }
    }

    /// Full prompt for one text
    pub fn render(&self, text: &str) -> String {
        format!(
            "{}{}\n\nReply ONLY with the text marked, without additional explanations.",
            self.preamble, text
        )
    }
}
