use crate::schema::FarmcomConfig;

use super::helpers::validate_not_blank;

pub(crate) fn validate_assistant(errors: &mut Vec<String>, config: &FarmcomConfig) {
    let assistant = &config.assistant;
    validate_not_blank(
        errors,
        "assistant.system_instruction",
        &assistant.system_instruction,
    );
    validate_not_blank(errors, "assistant.greeting", &assistant.greeting);
    validate_not_blank(errors, "assistant.error_message", &assistant.error_message);
}
