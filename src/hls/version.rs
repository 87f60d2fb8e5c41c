//! Manifest-version compatibility transform.
//!
//! Rewrites the baseline `#EXT-X-VERSION:6` tag to a caller-requested
//! version. This is a fixed-pattern substitution against the serialized
//! manifest text, not a general version rewrite: only the hardcoded
//! baseline 6 is matched. Runs after serialization and before response
//! encoding.

/// Independent-segments feature tag, unsupported below protocol version 6.
const INDEPENDENT_SEGMENTS_TAG: &str = "#EXT-X-INDEPENDENT-SEGMENTS";

/// Baseline version tag this transform matches.
const BASELINE_VERSION_TAG: &str = "#EXT-X-VERSION:6";

/// Rewrite the manifest version tag to `force_version`.
///
/// Replaces the first `#EXT-X-VERSION:6` occurrence. When downgrading below
/// 6, the `#EXT-X-INDEPENDENT-SEGMENTS` line is removed as well. Text
/// without the baseline tag passes through byte-identical (apart from the
/// downgrade line removal).
pub fn force_version(content: &str, force_version: u32) -> String {
    let replaced = content.replacen(
        BASELINE_VERSION_TAG,
        &format!("#EXT-X-VERSION:{force_version}"),
        1,
    );

    if force_version >= 6 {
        return replaced;
    }

    let mut out = String::with_capacity(replaced.len());
    for line in replaced.lines() {
        if line.trim() == INDEPENDENT_SEGMENTS_TAG {
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}
