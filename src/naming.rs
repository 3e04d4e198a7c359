//! Case conversion for option names and module names.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Pluralized abbreviation at the end of a name, e.g. the `ARNs` in `TargetGroupARNs`.
static PLURAL_ABBREVIATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Z]{3,}s$").expect("plural abbreviation pattern"));
static FIRST_CAP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(.)([A-Z][a-z]+)").expect("first cap pattern"));
static ALL_CAP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z]+)").expect("all cap pattern"));

/// Convert a mixed-case schema name to lowercase-underscore form.
///
/// A trailing run of three or more capitals followed by `s` is treated as a
/// pluralized abbreviation, so the word boundary lands before the run:
///
/// ```
/// use cfn_modgen::camel_to_snake;
///
/// assert_eq!(camel_to_snake("TargetGroupARNs"), "target_group_arns");
/// assert_eq!(camel_to_snake("FOOBar"), "foo_bar");
/// assert_eq!(camel_to_snake("already_snake"), "already_snake");
/// ```
pub fn camel_to_snake(name: &str) -> String {
    let plural = PLURAL_ABBREVIATION.replace(name, |caps: &Captures| {
        format!("_{}", caps[0].to_lowercase())
    });
    // Nothing preceded the abbreviation
    let plural = match plural.strip_prefix('_') {
        Some(rest) if !name.starts_with('_') => rest.to_string(),
        _ => plural.into_owned(),
    };

    let first = FIRST_CAP.replace_all(&plural, "${1}_${2}");
    ALL_CAP.replace_all(&first, "${1}_${2}").to_lowercase()
}

/// Module name for a resource type name.
///
/// The vendor segment is dropped: `AWS::Logs::LogGroup` becomes `logs_log_group`.
pub fn module_name(type_name: &str) -> String {
    let joined: String = type_name.split("::").skip(1).collect();
    camel_to_snake(&joined)
}

/// Case-converted option path for a schema JSON pointer.
///
/// `/properties/LoggingConfig/DestinationBucketName` becomes
/// `["logging_config", "destination_bucket_name"]`. Array wildcards (`*`) are
/// skipped because list items share their parent's suboptions. Pointers outside
/// `/properties/` yield their final segment only.
pub fn property_path(pointer: &str) -> Vec<String> {
    let unescape = |part: &str| part.replace("~1", "/").replace("~0", "~");

    match pointer.strip_prefix("/properties/") {
        Some(rest) => rest
            .split('/')
            .filter(|part| !part.is_empty() && *part != "*")
            .map(|part| camel_to_snake(&unescape(part)))
            .collect(),
        None => pointer
            .rsplit('/')
            .next()
            .filter(|part| !part.is_empty())
            .map(|part| vec![camel_to_snake(&unescape(part.trim()))])
            .unwrap_or_default(),
    }
}
