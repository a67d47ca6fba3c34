//! Archive, event, and generator fixtures.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::{Value, json};

/// Write a zip archive containing `entries` (name, contents) to `archive`.
///
/// # Errors
///
/// Returns an error when the archive cannot be written.
pub fn write_zip_archive(archive: &Path, entries: &[(&str, &[u8])]) -> anyhow::Result<()> {
    let file = File::create(archive)?;
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::FileOptions::default();
    for (path, contents) in entries {
        zip.start_file(*path, options)?;
        zip.write_all(contents)?;
    }
    zip.finish()?;
    Ok(())
}

/// Zip `entries` in memory.
///
/// # Errors
///
/// Returns an error when the archive cannot be encoded.
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> anyhow::Result<Vec<u8>> {
    let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = zip::write::FileOptions::default();
    for (path, contents) in entries {
        zip.start_file(*path, options)?;
        zip.write_all(contents)?;
    }
    Ok(zip.finish()?.into_inner())
}

/// Trigger event with one input artifact and no output artifact.
#[must_use]
pub fn trigger_event(job_id: &str, source_bucket: &str, source_key: &str) -> Value {
    json!({
        "CodePipeline.job": {
            "id": job_id,
            "data": {
                "inputArtifacts": [{
                    "name": "SourceArtifact",
                    "revision": "3f2a9c1",
                    "location": {
                        "type": "S3",
                        "s3Location": { "bucketName": source_bucket, "objectKey": source_key }
                    }
                }],
                "outputArtifacts": [],
                "actionConfiguration": { "configuration": {} }
            }
        }
    })
}

/// Trigger event that also names an output artifact.
#[must_use]
pub fn trigger_event_with_output(
    job_id: &str,
    source: (&str, &str),
    output: (&str, &str),
) -> Value {
    let mut event = trigger_event(job_id, source.0, source.1);
    event["CodePipeline.job"]["data"]["outputArtifacts"] = json!([{
        "name": "SiteArtifact",
        "location": {
            "type": "S3",
            "s3Location": { "bucketName": output.0, "objectKey": output.1 }
        }
    }]);
    event
}

/// Set the `UserParameters` string on an event built by [`trigger_event`].
pub fn set_user_parameters(event: &mut Value, parameters: &str) {
    event["CodePipeline.job"]["data"]["actionConfiguration"]["configuration"]
        ["UserParameters"] = Value::String(parameters.to_string());
}

/// Write an executable shell script standing in for the site generator.
///
/// The body runs under `/bin/sh` with the generator arguments in `$@`.
///
/// # Errors
///
/// Returns an error when the script cannot be written or made executable.
pub fn write_fake_generator(dir: &Path, body: &str) -> anyhow::Result<PathBuf> {
    let path = dir.join("fake-generator.sh");
    fs::write(&path, format!("#!/bin/sh\n{body}\n"))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
    }
    Ok(path)
}

/// Generator body that copies `--source` to `--destination` and records its arguments
/// in `args.txt` under the destination.
pub const COPYING_GENERATOR: &str = r#"src=""
dst=""
for arg in "$@"; do
  case "$arg" in
    --source=*) src="${arg#--source=}" ;;
    --destination=*) dst="${arg#--destination=}" ;;
  esac
done
cp -R "$src"/. "$dst"/
printf '%s\n' "$@" > "$dst/args.txt"
echo "generated site"
"#;

/// Generator body that prints to both streams and exits with status 3.
pub const FAILING_GENERATOR: &str = r#"echo "building pages"
echo "template error: missing partial" >&2
exit 3
"#;
