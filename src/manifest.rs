//! Adds the bluetooth permission strings and background mode to an app manifest (Info.plist).
//!
//! This module is also compiled into the build script, which uses it to generate the Info.plist
//! that is embedded into the macOS binary. It must only depend on std and serde_json.

use std::fmt::Write;
use serde_json::{Map, Value};

pub const BLUETOOTH_ALWAYS_USAGE_KEY: &str = "NSBluetoothAlwaysUsageDescription";
pub const BLUETOOTH_PERIPHERAL_USAGE_KEY: &str = "NSBluetoothPeripheralUsageDescription";
pub const BACKGROUND_MODES_KEY: &str = "UIBackgroundModes";

pub const BLUETOOTH_ALWAYS_USAGE: &str =
    "This app uses Bluetooth to find and connect to your E-Cleaning device.";
pub const BLUETOOTH_PERIPHERAL_USAGE: &str =
    "This app uses Bluetooth to communicate with your E-Cleaning device.";
pub const BLUETOOTH_BACKGROUND_MODE: &str = "bluetooth-central";

/// Applying the patch more than once has the same result as applying it once.
pub fn patch_manifest(manifest: &mut Map<String, Value>) {
    manifest.insert(BLUETOOTH_ALWAYS_USAGE_KEY.to_string(), Value::from(BLUETOOTH_ALWAYS_USAGE));
    manifest.insert(BLUETOOTH_PERIPHERAL_USAGE_KEY.to_string(), Value::from(BLUETOOTH_PERIPHERAL_USAGE));

    let modes = manifest
        .entry(BACKGROUND_MODES_KEY)
        .or_insert_with(|| Value::Array(Vec::new()));

    // a lone string is what some tools write for a single mode
    if let Value::String(mode) = modes {
        *modes = Value::Array(vec![Value::String(std::mem::take(mode))]);
    }
    if !modes.is_array() {
        *modes = Value::Array(Vec::new());
    }

    if let Value::Array(modes) = modes {
        if !modes.iter().any(|mode| mode.as_str() == Some(BLUETOOTH_BACKGROUND_MODE)) {
            modes.push(Value::from(BLUETOOTH_BACKGROUND_MODE));
        }
    }
}

/// Walks `/`-separated `path` from `root`, creating dictionaries where keys are missing. Returns
/// `None` if something other than a dictionary is in the way.
pub fn dictionary_at_mut<'a>(root: &'a mut Value, path: &str) -> Option<&'a mut Map<String, Value>> {
    let mut current = root;

    for key in path.split('/').filter(|key| !key.is_empty()) {
        current = current
            .as_object_mut()?
            .entry(key)
            .or_insert_with(|| Value::Object(Map::new()));
    }

    current.as_object_mut()
}

/// Characters XML 1.0 does not allow anywhere in a document, not even as a character reference.
fn is_forbidden_in_xml(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{8}' | '\u{B}' | '\u{C}' | '\u{E}'..='\u{1F}' | '\u{FFFE}' | '\u{FFFF}')
}

/// Escapes markup and drops the characters that would make the plist unreadable.
fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            c if is_forbidden_in_xml(c) => {},
            _ => escaped.push(c),
        }
    }
    escaped
}

fn write_value(out: &mut String, value: &Value, depth: usize) {
    let indent = "\t".repeat(depth);

    match value {
        Value::Null => {},
        Value::Bool(true) => { let _ = writeln!(out, "{}<true/>", indent); },
        Value::Bool(false) => { let _ = writeln!(out, "{}<false/>", indent); },
        Value::Number(number) if number.is_f64() => {
            let _ = writeln!(out, "{}<real>{}</real>", indent, number);
        },
        Value::Number(number) => { let _ = writeln!(out, "{}<integer>{}</integer>", indent, number); },
        Value::String(text) => { let _ = writeln!(out, "{}<string>{}</string>", indent, escape_xml(text)); },
        Value::Array(items) => {
            let _ = writeln!(out, "{}<array>", indent);
            for item in items {
                write_value(out, item, depth + 1);
            }
            let _ = writeln!(out, "{}</array>", indent);
        },
        Value::Object(entries) => write_dict(out, entries, depth),
    }
}

fn write_dict(out: &mut String, entries: &Map<String, Value>, depth: usize) {
    let indent = "\t".repeat(depth);
    let _ = writeln!(out, "{}<dict>", indent);

    // property lists have no null, so the key is left out entirely
    for (key, value) in entries.iter().filter(|(_, value)| !value.is_null()) {
        let _ = writeln!(out, "{}\t<key>{}</key>", indent, escape_xml(key));
        write_value(out, value, depth + 1);
    }

    let _ = writeln!(out, "{}</dict>", indent);
}

/// Renders `manifest` as an XML property list.
pub fn render_plist(manifest: &Map<String, Value>) -> String {
    let mut out = String::from(concat!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
        "<!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" \"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n",
        "<plist version=\"1.0\">\n",
    ));
    write_dict(&mut out, manifest, 0);
    out.push_str("</plist>\n");
    out
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use super::*;

    fn patched(manifest: Value) -> Map<String, Value> {
        let mut manifest = manifest.as_object().unwrap().clone();
        patch_manifest(&mut manifest);
        manifest
    }

    #[test]
    fn adds_usage_strings_and_background_mode() {
        let manifest = patched(json!({ "CFBundleName": "E-Cleaning" }));

        assert_eq!(manifest[BLUETOOTH_ALWAYS_USAGE_KEY], BLUETOOTH_ALWAYS_USAGE);
        assert_eq!(manifest[BLUETOOTH_PERIPHERAL_USAGE_KEY], BLUETOOTH_PERIPHERAL_USAGE);
        assert_eq!(manifest[BACKGROUND_MODES_KEY], json!([BLUETOOTH_BACKGROUND_MODE]));
        assert_eq!(manifest["CFBundleName"], "E-Cleaning");
    }

    #[test]
    fn keeps_existing_background_modes() {
        let manifest = patched(json!({ "UIBackgroundModes": ["audio"] }));
        assert_eq!(manifest[BACKGROUND_MODES_KEY], json!(["audio", BLUETOOTH_BACKGROUND_MODE]));

        let manifest = patched(json!({ "UIBackgroundModes": "fetch" }));
        assert_eq!(manifest[BACKGROUND_MODES_KEY], json!(["fetch", BLUETOOTH_BACKGROUND_MODE]));
    }

    #[test]
    fn patching_twice_changes_nothing() {
        let once = patched(json!({
            "NSBluetoothAlwaysUsageDescription": "old text",
            "UIBackgroundModes": ["bluetooth-central", "audio"],
        }));
        let mut twice = once.clone();
        patch_manifest(&mut twice);

        assert_eq!(once, twice);
        assert_eq!(once[BACKGROUND_MODES_KEY], json!([BLUETOOTH_BACKGROUND_MODE, "audio"]));
        assert_eq!(once[BLUETOOTH_ALWAYS_USAGE_KEY], BLUETOOTH_ALWAYS_USAGE);
    }

    #[test]
    fn nested_dictionaries_are_created() {
        let mut root = json!({ "expo": { "name": "E-Cleaning" } });
        patch_manifest(dictionary_at_mut(&mut root, "expo/ios/infoPlist").unwrap());

        assert_eq!(root["expo"]["name"], "E-Cleaning");
        assert_eq!(root["expo"]["ios"]["infoPlist"][BACKGROUND_MODES_KEY], json!([BLUETOOTH_BACKGROUND_MODE]));

        let mut root = json!({ "expo": "not a dictionary" });
        assert!(dictionary_at_mut(&mut root, "expo/ios").is_none());
    }

    #[test]
    fn renders_xml_plist() {
        let manifest = patched(json!({
            "CFBundleName": "E-Cleaning & Co",
            "LSMinimumSystemVersion": "10.15",
            "NSHighResolutionCapable": true,
            "Unset": null,
        }));
        let xml = render_plist(&manifest);

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"));
        assert!(xml.contains("\t<key>CFBundleName</key>\n\t<string>E-Cleaning &amp; Co</string>\n"));
        assert!(xml.contains("\t<key>NSHighResolutionCapable</key>\n\t<true/>\n"));
        assert!(xml.contains("\t<key>UIBackgroundModes</key>\n\t<array>\n\t\t<string>bluetooth-central</string>\n\t</array>\n"));
        assert!(!xml.contains("Unset"));
        assert!(xml.ends_with("</dict>\n</plist>\n"));
    }

    #[test]
    fn control_characters_are_dropped() {
        let manifest = json!({
            "Bell\u{7}Key": "tab\there\u{0}\u{1B}[0m\nnext line\u{FFFF}",
        }).as_object().unwrap().clone();
        let xml = render_plist(&manifest);

        assert!(xml.contains("<key>BellKey</key>"));
        assert!(xml.contains("<string>tab\there[0m\nnext line</string>"));
        assert!(!xml.chars().any(is_forbidden_in_xml));
    }
}
