use crate::schema::FarmcomConfig;

use super::helpers::{validate_not_blank, validate_range, validate_range_f64};

pub(crate) fn validate_model(errors: &mut Vec<String>, config: &FarmcomConfig) {
    let model = &config.model;
    validate_not_blank(errors, "model.id", &model.id);
    validate_not_blank(errors, "model.api_key_env", &model.api_key_env);

    if !model.base_url.starts_with("http://") && !model.base_url.starts_with("https://") {
        errors.push(format!(
            "model.base_url = {:?} must start with http:// or https://",
            model.base_url
        ));
    }

    validate_range(
        errors,
        "model.max_output_tokens",
        u64::from(model.max_output_tokens),
        1,
        65536,
    );
    validate_range_f64(errors, "model.temperature", model.temperature, 0.0, 2.0);
    validate_range(
        errors,
        "model.connect_timeout_secs",
        model.connect_timeout_secs,
        1,
        600,
    );
    validate_range(
        errors,
        "model.request_timeout_secs",
        model.request_timeout_secs,
        1,
        3600,
    );
}
