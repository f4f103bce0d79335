//! Tag inference and post-processing

use crate::settings::AppConfig;
use anyhow::{bail, Context};
use image::DynamicImage;
use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;

/// Produces scored tags for an image
pub trait Tagger: Send + Sync {
    /// Tags scoring at least `threshold`, best first
    fn infer(&self, image: &DynamicImage, threshold: f32) -> anyhow::Result<Vec<(String, f32)>>;
}

/// Runs an external program on a temporary PNG and reads scores from its stdout
pub struct CommandTagger {
    program: String,
    args: Vec<String>,
}

impl CommandTagger {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.tagger_command.clone(), config.tagger_args.clone())
    }

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("snaptag_{}.png", uuid::Uuid::new_v4()))
    }
}

impl Tagger for CommandTagger {
    fn infer(&self, image: &DynamicImage, threshold: f32) -> anyhow::Result<Vec<(String, f32)>> {
        let path = Self::temp_path();
        image
            .save_with_format(&path, image::ImageFormat::Png)
            .with_context(|| format!("Failed to write {:?}", path))?;

        log::debug!("Running {} on {:?}", self.program, path);
        let output = Command::new(&self.program).args(&self.args).arg(&path).output();

        if let Err(e) = std::fs::remove_file(&path) {
            log::warn!("Failed to remove {:?}: {}", path, e);
        }

        let output = output.with_context(|| format!("Failed to run tagger {:?}", self.program))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("Tagger exited with {}: {}", output.status, stderr.trim());
        }

        let mut tags = parse_scores(&String::from_utf8_lossy(&output.stdout));
        tags.retain(|(_, score)| *score >= threshold);
        tags.sort_by(|a, b| b.1.total_cmp(&a.1));
        Ok(tags)
    }
}

/// Parse `tag<TAB>score`, `tag,score` or `tag: score` lines
///
/// Blank and unparseable lines are skipped.
pub fn parse_scores(output: &str) -> Vec<(String, f32)> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let (tag, score) = line
                .rsplit_once('\t')
                .or_else(|| line.rsplit_once(','))
                .or_else(|| line.rsplit_once(':'))?;
            let tag = tag.trim();
            match score.trim().parse::<f32>() {
                Ok(score) if !tag.is_empty() => Some((tag.to_string(), score)),
                _ => {
                    log::debug!("Skipping tagger line {:?}", line);
                    None
                }
            }
        })
        .collect()
}

/// Turns scored tags into the clipboard string
#[derive(Debug, Clone)]
pub struct TagFormatter {
    pub use_underscore: bool,
    pub exclusion_list: Vec<String>,
}

impl TagFormatter {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            use_underscore: config.use_underscore,
            exclusion_list: config.exclusion_list.clone(),
        }
    }

    fn is_excluded(&self, tag: &str) -> bool {
        let normalized = tag.replace(' ', "_");
        self.exclusion_list
            .iter()
            .any(|excluded| excluded.replace(' ', "_") == normalized)
    }

    pub fn format(&self, tags: &[(String, f32)]) -> String {
        tags.iter()
            .map(|(tag, _)| tag.as_str())
            .filter(|tag| !self.is_excluded(tag))
            .map(|tag| {
                if self.use_underscore {
                    tag.replace(' ', "_")
                } else {
                    tag.replace('_', " ")
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Inference plus formatting with one threshold
#[derive(Clone)]
pub struct TagPipeline {
    tagger: Arc<dyn Tagger>,
    formatter: TagFormatter,
    threshold: f32,
}

impl TagPipeline {
    pub fn new(tagger: Arc<dyn Tagger>, config: &AppConfig) -> Self {
        Self {
            tagger,
            formatter: TagFormatter::from_config(config),
            threshold: config.threshold,
        }
    }

    pub fn tag(&self, image: &DynamicImage) -> anyhow::Result<String> {
        let scored = self.tagger.infer(image, self.threshold).context("Inference failed")?;
        let tags = self.formatter.format(&scored);
        log::info!("Tagged {}x{} image: {} tags", image.width(), image.height(), scored.len());
        Ok(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedTagger(Vec<(String, f32)>);

    impl Tagger for FixedTagger {
        fn infer(&self, _image: &DynamicImage, threshold: f32) -> anyhow::Result<Vec<(String, f32)>> {
            Ok(self.0.iter().filter(|(_, s)| *s >= threshold).cloned().collect())
        }
    }

    fn scored(items: &[(&str, f32)]) -> Vec<(String, f32)> {
        items.iter().map(|(t, s)| (t.to_string(), *s)).collect()
    }

    #[test]
    fn parses_mixed_separators() {
        let out = "1girl\t0.98\nlong_hair, 0.71\nsolo: 0.5\n\ngarbage\nrating:safe\t0.9\nnan_tag\tx\n";
        assert_eq!(
            parse_scores(out),
            scored(&[("1girl", 0.98), ("long_hair", 0.71), ("solo", 0.5), ("rating:safe", 0.9)])
        );
    }

    #[test]
    fn formatter_uses_spaces_by_default() {
        let formatter = TagFormatter {
            use_underscore: false,
            exclusion_list: vec![],
        };
        assert_eq!(
            formatter.format(&scored(&[("long_hair", 0.9), ("blue eyes", 0.8)])),
            "long hair, blue eyes"
        );
    }

    #[test]
    fn formatter_keeps_underscores_when_asked() {
        let formatter = TagFormatter {
            use_underscore: true,
            exclusion_list: vec![],
        };
        assert_eq!(
            formatter.format(&scored(&[("long_hair", 0.9), ("blue eyes", 0.8)])),
            "long_hair, blue_eyes"
        );
    }

    #[test]
    fn exclusions_match_either_spelling() {
        let formatter = TagFormatter {
            use_underscore: false,
            exclusion_list: vec!["simple background".into()],
        };
        assert_eq!(
            formatter.format(&scored(&[("simple_background", 0.9), ("solo", 0.8)])),
            "solo"
        );
    }

    #[test]
    fn pipeline_applies_threshold() {
        let config = AppConfig {
            threshold: 0.5,
            ..Default::default()
        };
        let tagger = Arc::new(FixedTagger(scored(&[("a_b", 0.9), ("c", 0.4)])));
        let pipeline = TagPipeline::new(tagger, &config);
        assert_eq!(pipeline.tag(&DynamicImage::new_rgba8(4, 4)).unwrap(), "a b");
    }

    #[cfg(unix)]
    #[test]
    fn command_tagger_reads_stdout() {
        let tagger = CommandTagger::new(
            "sh",
            vec!["-c".into(), "printf 'cat\\t0.9\\ndog\\t0.2\\n'; test -f \"$0\"".into()],
        );
        let tags = tagger.infer(&DynamicImage::new_rgba8(2, 2), 0.35).unwrap();
        assert_eq!(tags, scored(&[("cat", 0.9)]));
    }

    #[cfg(unix)]
    #[test]
    fn command_tagger_reports_failure() {
        let tagger = CommandTagger::new("sh", vec!["-c".into(), "echo boom >&2; exit 3".into()]);
        let err = tagger.infer(&DynamicImage::new_rgba8(2, 2), 0.0).unwrap_err();
        assert!(err.to_string().contains("boom"));
    }
}
