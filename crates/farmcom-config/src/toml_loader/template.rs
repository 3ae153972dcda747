//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# FarmCom Chat Configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[model]
# id = "gemini-2.0-flash"
# api_key_env = "GEMINI_API_KEY"   # environment variable holding the API key
# base_url = "https://generativelanguage.googleapis.com/v1beta/models"
# max_output_tokens = 2048         # 1-65536
# temperature = 0.7                # 0.0-2.0
# connect_timeout_secs = 10
# request_timeout_secs = 120

[assistant]
# system_instruction = "You are FarmCom Assistant, an agricultural expert helping farmers. ..."
# greeting = "Hello! I'm your FarmCom assistant. Ask me anything about crops, soil, weather, or farm equipment."
# error_message = "Sorry, I encountered an error. Please try again."

[logging]
# level = "info"                   # trace, debug, info, warn, error
"##
    .to_string()
}
