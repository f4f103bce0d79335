//! Command line handling

use anyhow::{bail, Context};
use std::path::PathBuf;

pub const USAGE: &str = "\
Usage:
  snaptag [--screen N]                         select a region and tag it
  snaptag --process-file PATH [--delete-after]  tag an image file
  snaptag --process-url URL                     tag an image behind a URL
  snaptag --write-config                        write the current settings file";

/// What the process was started to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Interactive overlay; `None` opens one per monitor
    Overlay { screen: Option<usize> },
    ProcessFile { path: PathBuf, delete_after: bool },
    ProcessUrl(String),
    /// Save the effective settings so they can be edited
    WriteConfig,
    Help,
}

/// Parse arguments, program name excluded
pub fn parse<I, S>(args: I) -> anyhow::Result<Invocation>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut args = args.into_iter().map(Into::into);
    let mut screen = None;
    let mut file: Option<PathBuf> = None;
    let mut url = None;
    let mut delete_after = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Invocation::Help),
            "--write-config" => return Ok(Invocation::WriteConfig),
            "--screen" => {
                let value = args.next().context("--screen needs a monitor index")?;
                screen = Some(
                    value
                        .parse::<usize>()
                        .with_context(|| format!("Invalid monitor index: {}", value))?,
                );
            }
            "--process-file" => {
                file = Some(args.next().context("--process-file needs a path")?.into());
            }
            "--process-url" => {
                url = Some(args.next().context("--process-url needs a URL")?);
            }
            "--delete-after" => delete_after = true,
            flag if flag.starts_with("--") => bail!("Unknown option: {}", flag),
            // A bare argument is an image path
            path => file = Some(path.into()),
        }
    }

    match (file, url) {
        (Some(_), Some(_)) => bail!("Use either a file or a URL, not both"),
        (Some(path), None) => Ok(Invocation::ProcessFile { path, delete_after }),
        (None, Some(url)) => Ok(Invocation::ProcessUrl(url)),
        (None, None) if delete_after => bail!("--delete-after needs a file"),
        (None, None) => Ok(Invocation::Overlay { screen }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_arguments_opens_every_monitor() {
        assert_eq!(
            parse(Vec::<String>::new()).unwrap(),
            Invocation::Overlay { screen: None }
        );
    }

    #[test]
    fn screen_index() {
        assert_eq!(
            parse(["--screen", "2"]).unwrap(),
            Invocation::Overlay { screen: Some(2) }
        );
        assert!(parse(["--screen", "left"]).is_err());
        assert!(parse(["--screen"]).is_err());
    }

    #[test]
    fn delete_after_may_come_first() {
        let expected = Invocation::ProcessFile {
            path: PathBuf::from("/tmp/x.png"),
            delete_after: true,
        };
        assert_eq!(parse(["--delete-after", "/tmp/x.png"]).unwrap(), expected);
        assert_eq!(
            parse(["--process-file", "/tmp/x.png", "--delete-after"]).unwrap(),
            expected
        );
    }

    #[test]
    fn url_mode() {
        assert_eq!(
            parse(["--process-url", "https://example.com/a.jpg"]).unwrap(),
            Invocation::ProcessUrl("https://example.com/a.jpg".into())
        );
    }

    #[test]
    fn write_config_flag() {
        assert_eq!(parse(["--write-config"]).unwrap(), Invocation::WriteConfig);
    }

    #[test]
    fn conflicting_inputs_are_refused() {
        assert!(parse(["--process-url", "https://a/b.png", "c.png"]).is_err());
        assert!(parse(["--delete-after"]).is_err());
        assert!(parse(["--bogus"]).is_err());
    }
}
