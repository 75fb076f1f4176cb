//! Resolve → transform → humanize → encode.
//!
//! Stages run strictly in order and the first error aborts the rest. All
//! settings arrive in a `PipelineConfig` value; nothing is read from global
//! state.

use crate::arguments::{ArgumentSet, EnumerationMap};
use crate::encoder::{invoke, CompiledArtifact, EncoderCommand};
use crate::error::Result;
use crate::humanize::{humanize, HumanizationConfig};
use crate::layout::{KeyboardLayout, LayoutAllowList};
use crate::resolver::resolve;
use crate::template::ScriptTemplate;
use crate::transform::{transform, TransformWarning};
use crate::types::DeviceFormat;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;

/// Everything one compilation request needs
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub format: DeviceFormat,
    /// Layout code, checked against `allowed_layouts` before any file I/O
    pub layout: String,
    pub allowed_layouts: LayoutAllowList,
    pub humanization: HumanizationConfig,
    /// Seed for reproducible humanization; random when `None`
    pub seed: Option<u64>,
    pub output: PathBuf,
    pub encoder: EncoderCommand,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let format = DeviceFormat::default();
        Self {
            format,
            layout: "us".to_string(),
            allowed_layouts: LayoutAllowList::default(),
            humanization: HumanizationConfig::default(),
            seed: None,
            output: PathBuf::from(format.default_output()),
            encoder: EncoderCommand::default(),
        }
    }
}

impl PipelineConfig {
    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

/// Final lines before encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub layout: KeyboardLayout,
    pub lines: Vec<String>,
    pub warnings: Vec<TransformWarning>,
}

/// Result of a successful compilation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compilation {
    pub artifact: CompiledArtifact,
    pub warnings: Vec<TransformWarning>,
}

/// Run every stage except encoding, with the RNG derived from `config.seed`.
pub fn render(
    template: &ScriptTemplate,
    args: &ArgumentSet,
    enum_map: &EnumerationMap,
    config: &PipelineConfig,
) -> Result<Rendered> {
    let mut rng = config.rng();
    render_with_rng(template, args, enum_map, config, &mut rng)
}

/// Run every stage except encoding with a caller-supplied RNG.
pub fn render_with_rng<R: Rng + ?Sized>(
    template: &ScriptTemplate,
    args: &ArgumentSet,
    enum_map: &EnumerationMap,
    config: &PipelineConfig,
    rng: &mut R,
) -> Result<Rendered> {
    let layout = config.allowed_layouts.validate(&config.layout)?;

    let lines = resolve(template, args, enum_map)?;
    let transformed = transform(lines, config.format, layout.as_str());
    let lines = humanize(transformed.lines, &config.humanization, rng);

    Ok(Rendered {
        layout,
        lines,
        warnings: transformed.warnings,
    })
}

/// Full pipeline: render, then write the artifact to `config.output`.
pub fn compile(
    template: &ScriptTemplate,
    args: &ArgumentSet,
    enum_map: &EnumerationMap,
    config: PipelineConfig,
) -> Result<Compilation> {
    log::info!(
        "Compiling payload for {} (layout {}) -> {}",
        config.format,
        config.layout,
        config.output.display()
    );

    let rendered = render(template, args, enum_map, &config)?;
    let artifact = invoke(
        &rendered.lines,
        config.format,
        &rendered.layout,
        &config.output,
        &config.encoder,
    )?;

    Ok(Compilation {
        artifact,
        warnings: rendered.warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arguments::ArgumentValue;
    use crate::error::ForgeError;

    fn hello() -> (ScriptTemplate, ArgumentSet) {
        let template = ScriptTemplate::parse("REM desc\nSTRING Hello {name}\nENTER").unwrap();
        let mut args = ArgumentSet::new();
        args.insert("name", ArgumentValue::Literal("World".into()));
        (template, args)
    }

    #[test]
    fn test_render_plain_without_humanization() {
        let (template, args) = hello();
        let rendered =
            render(&template, &args, &EnumerationMap::new(), &PipelineConfig::default()).unwrap();
        assert_eq!(rendered.lines, vec!["STRING Hello World", "ENTER"]);
        assert!(rendered.warnings.is_empty());
    }

    #[test]
    fn test_invalid_layout_rejected_first() {
        let template = ScriptTemplate::parse("REM only comments").unwrap();
        let config = PipelineConfig {
            layout: "xx".to_string(),
            ..PipelineConfig::default()
        };
        let err = render(&template, &ArgumentSet::new(), &EnumerationMap::new(), &config)
            .unwrap_err();
        assert!(matches!(err, ForgeError::InvalidLayout { .. }));
    }

    #[test]
    fn test_seeded_render_is_reproducible() {
        let (template, args) = hello();
        let config = PipelineConfig {
            humanization: HumanizationConfig::new(80, 30),
            seed: Some(1234),
            ..PipelineConfig::default()
        };
        let first = render(&template, &args, &EnumerationMap::new(), &config).unwrap();
        let second = render(&template, &args, &EnumerationMap::new(), &config).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.lines.len(), "Hello World".len() * 2 + 1);
    }

    #[test]
    fn test_delayed_tag_warning_is_returned() {
        let (template, args) = hello();
        let config = PipelineConfig {
            format: DeviceFormat::DelayedTag,
            ..PipelineConfig::default()
        };
        let rendered = render(&template, &args, &EnumerationMap::new(), &config).unwrap();
        assert_eq!(rendered.lines[0], "DUCKY_LANG us");
        assert_eq!(rendered.warnings, vec![TransformWarning::LayoutTagWithoutDelay]);
    }
}
