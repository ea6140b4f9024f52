//! Instruction prompt for the translation model

/// Instruction text for a translation between two named languages
fn instruction(source_name: &str, target_name: &str) -> String {
    format!(
        "Translate the following text from {source_name} to {target_name}. \
         For non-standard text, follow this process: \
         1) Segment the text into meaningful units; \
         2) Identify non-standard spellings, abbreviations, or slang and map them to standard forms; \
         3) Infer the meaning of any colloquial terms using context; \
         4) Mentally reconstruct the normalized version of the original sentence; \
         5) Translate accurately based on the reconstructed meaning. \
         Return ONLY the final translation result without any explanations or process notes."
    )
}

/// Build the Alpaca-style completion prompt.
///
/// Language arguments are display names, already resolved from codes.
pub fn build_prompt(text: &str, source_name: &str, target_name: &str) -> String {
    format!(
        "Below is an instruction that describes a task, paired with an input that provides further context. \
         Write a response that appropriately completes the request.\n\
         ### Instruction:\n{}\n\
         ### Input:\n{text}\n### Response:",
        instruction(source_name, target_name)
    )
}
