use serde::Deserialize;
use std::collections::BTreeMap;

/// How an icon should be coloured. The registry stores these by name and never interprets them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeDefinition {
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub css_variable: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub inline_styles: BTreeMap<String, String>,
}

impl ThemeDefinition {
    pub fn css_variable(variable: impl Into<String>) -> Self {
        Self {
            css_variable: Some(variable.into()),
            ..Self::default()
        }
    }

    pub fn color(color: impl Into<String>) -> Self {
        Self {
            color: Some(color.into()),
            ..Self::default()
        }
    }

    pub fn with_style(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.inline_styles.insert(property.into(), value.into());
        self
    }
}

/// An animation applied to a rendered icon. Stored by name, opaque to the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationDefinition {
    pub class_name: String,
    #[serde(default)]
    pub inline_styles: BTreeMap<String, String>,
    #[serde(default)]
    pub keyframes: Option<String>,
}

impl AnimationDefinition {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            ..Self::default()
        }
    }

    pub fn with_style(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.inline_styles.insert(property.into(), value.into());
        self
    }

    pub fn with_keyframes(mut self, keyframes: impl Into<String>) -> Self {
        self.keyframes = Some(keyframes.into());
        self
    }
}

/// The stock themes and animations.
///
/// Animations reference keyframes named `wb-icon-<name>`; the keyframe CSS itself is left to
/// whoever renders the icons.
pub mod presets {
    use crate::config::IconConfig;
    use crate::theme::{AnimationDefinition, ThemeDefinition};
    use std::collections::BTreeMap;

    // (theme name, css variable suffix, fallback colour)
    const COLOR_THEMES: [(&str, &str, &str); 13] = [
        ("primary", "primary", "#246BFE"),
        ("secondary", "secondary", "#030c1a"),
        ("success", "success", "#2DCE89"),
        ("green", "green", "#0B9850"),
        ("warning", "warning", "#FF8C42"),
        ("danger", "danger", "#FB6340"),
        ("orange", "orange", "#FB6340"),
        ("gray", "gray", "#828286"),
        ("gray2", "gray-2", "#8898aa"),
        ("gray3", "gray-3", "#5f6368"),
        ("blue2", "blue-2", "#32325d"),
        ("blue", "blue", "#246BFE"),
        ("purple", "purple", "#525f7f"),
    ];

    // (name, animation shorthand, whether it rotates or scales around the centre)
    const ANIMATIONS: [(&str, &str, bool); 13] = [
        ("spin", "1.2s linear infinite", true),
        ("rotate", "1.2s linear infinite", true),
        ("pulse", "1.1s ease-in-out infinite", true),
        ("bounce", "1.2s ease-in-out infinite", false),
        ("shake", "0.6s ease-in-out 0s infinite", true),
        ("fade", "1.5s ease-in-out infinite", false),
        ("zoom", "1s ease-in-out infinite", true),
        ("tada", "1s ease-in-out infinite", true),
        ("float", "3s ease-in-out infinite", false),
        ("glow", "2s ease-in-out infinite", false),
        ("tilt", "2s ease-in-out infinite", true),
        ("flip", "1s ease-in-out infinite", true),
        ("rubber", "0.8s ease-in-out infinite", true),
    ];

    pub fn themes() -> BTreeMap<String, ThemeDefinition> {
        let mut themes: BTreeMap<_, _> = COLOR_THEMES
            .iter()
            .map(|(name, suffix, fallback)| {
                let variable = format!("--wb-icon-color-{suffix}");
                let value = format!("var(--wb-color-{suffix}, {fallback})");
                let theme = ThemeDefinition::css_variable(variable.clone()).with_style(variable, value);

                (name.to_string(), theme)
            })
            .collect();

        themes.insert(
            "muted".into(),
            ThemeDefinition::color("var(--wb-icon-color-muted, rgba(107, 114, 128, 1))"),
        );

        themes
    }

    pub fn animations() -> BTreeMap<String, AnimationDefinition> {
        ANIMATIONS
            .iter()
            .map(|(name, timing, centred)| {
                let mut animation = AnimationDefinition::new(format!("wb-icon--{name}"))
                    .with_style("animation", format!("wb-icon-{name} {timing}"));

                if *centred {
                    animation = animation.with_style("transform-origin", "center");
                }
                if *name == "bounce" {
                    animation = animation.with_style("display", "inline-flex");
                }

                (name.to_string(), animation)
            })
            .collect()
    }

    /// A configuration registering every stock theme and animation.
    pub fn config() -> IconConfig {
        IconConfig {
            themes: themes(),
            animations: animations(),
            ..IconConfig::default()
        }
    }
}

#[cfg(test)]
mod test {
    use crate::theme::{AnimationDefinition, ThemeDefinition, presets};
    use std::error::Error;

    #[test]
    fn deserializes_definitions() -> Result<(), Box<dyn Error>> {
        let theme: ThemeDefinition = serde_json::from_str(
            r#"{ "cssVariable": "--brand", "inlineStyles": { "--brand": "red" } }"#,
        )?;
        assert_eq!(
            theme,
            ThemeDefinition::css_variable("--brand").with_style("--brand", "red")
        );

        let animation: AnimationDefinition = serde_json::from_str(
            r#"{ "className": "spin", "inlineStyles": { "animation": "spin 1s linear infinite" } }"#,
        )?;
        assert_eq!(
            animation,
            AnimationDefinition::new("spin").with_style("animation", "spin 1s linear infinite")
        );

        Ok(())
    }

    #[test]
    fn animation_requires_class_name() {
        assert!(serde_json::from_str::<AnimationDefinition>(r#"{ "keyframes": "" }"#).is_err());
    }

    #[test]
    fn preset_themes() {
        let themes = presets::themes();

        assert_eq!(themes.len(), 14);

        let gray2 = &themes["gray2"];
        assert_eq!(gray2.css_variable.as_deref(), Some("--wb-icon-color-gray-2"));
        assert_eq!(
            gray2.inline_styles.get("--wb-icon-color-gray-2").map(String::as_str),
            Some("var(--wb-color-gray-2, #8898aa)")
        );

        assert!(themes["muted"].css_variable.is_none());
        assert!(themes["muted"].color.is_some());
    }

    #[test]
    fn preset_animations() {
        let animations = presets::animations();

        assert_eq!(animations.len(), 13);

        let spin = &animations["spin"];
        assert_eq!(spin.class_name, "wb-icon--spin");
        assert_eq!(
            spin.inline_styles.get("animation").map(String::as_str),
            Some("wb-icon-spin 1.2s linear infinite")
        );
        assert_eq!(
            spin.inline_styles.get("transform-origin").map(String::as_str),
            Some("center")
        );

        let fade = &animations["fade"];
        assert!(!fade.inline_styles.contains_key("transform-origin"));
        assert_eq!(
            animations["bounce"].inline_styles.get("display").map(String::as_str),
            Some("inline-flex")
        );
    }
}
