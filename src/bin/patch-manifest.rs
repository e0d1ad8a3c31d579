use std::fs;
use std::path::PathBuf;
use clap::{Parser, ValueEnum};
use log::info;
use serde_json::Value;
use ecleaning_connect::init_logging;
use ecleaning_connect::error::ManifestError;
use ecleaning_connect::manifest::{dictionary_at_mut, patch_manifest, render_plist};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Plist,
}

#[derive(Parser, Debug)]
#[command(author, version)]
#[command(about = "Adds the bluetooth usage descriptions and background mode to an app manifest.\n\nExample: ./target/release/patch-manifest app.json --dictionary expo/ios/infoPlist", long_about = None)]
struct Args {
    /// JSON manifest to patch
    input_path: PathBuf,

    /// Write the result here instead of overwriting the input; required for plist output
    #[arg(short, long, required_if_eq("format", "plist"))]
    output_path: Option<PathBuf>,

    /// `/`-separated path to the Info.plist dictionary inside the manifest; created if missing
    #[arg(long, default_value = "")]
    dictionary: String,

    /// Output format; plist writes only the patched dictionary
    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,
}

fn main() -> Result<(), ManifestError> {
    init_logging();
    let args = Args::parse();

    let content = fs::read_to_string(&args.input_path)?;
    let mut root: Value = serde_json::from_str(&content)?;

    let dictionary = dictionary_at_mut(&mut root, &args.dictionary)
        .ok_or(ManifestError::NotADictionary)?;
    patch_manifest(dictionary);

    let output = match args.format {
        Format::Json => serde_json::to_string_pretty(&root)? + "\n",
        Format::Plist => {
            let dictionary = dictionary_at_mut(&mut root, &args.dictionary)
                .ok_or(ManifestError::NotADictionary)?;
            render_plist(dictionary)
        },
    };

    let output_path = args.output_path.unwrap_or(args.input_path);
    fs::write(&output_path, output)?;

    info!("Patched manifest written to {}", output_path.to_string_lossy());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plist_output_needs_an_output_path() {
        let err = Args::try_parse_from(["patch-manifest", "app.json", "--format", "plist"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);

        let args = Args::try_parse_from(["patch-manifest", "app.json", "--format", "plist", "-o", "Info.plist"]).unwrap();
        assert_eq!(args.output_path, Some(PathBuf::from("Info.plist")));
        assert_eq!(args.format, Format::Plist);
    }

    #[test]
    fn json_output_overwrites_the_input_by_default() {
        let args = Args::try_parse_from(["patch-manifest", "app.json", "--dictionary", "expo/ios/infoPlist"]).unwrap();
        assert_eq!(args.output_path, None);
        assert_eq!(args.format, Format::Json);
    }
}
