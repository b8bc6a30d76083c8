//! Registered platform signatures evaluated against directory contents.

use super::{PlatformRole, PlatformType};

/// Evidence specification for one platform type.
///
/// Scoring weighs file presence at 40% and content-pattern matches at 60%,
/// scaled by `weight_multiplier`, with a penalty per matched exclusion.
#[derive(Debug, Clone)]
pub struct PlatformSignature {
    pub platform_type: PlatformType,
    /// Files whose presence counts toward the 40% file score
    pub marker_files: &'static [&'static str],
    /// (file name, substring) pairs counting toward the 60% content score
    pub content_markers: &'static [(&'static str, &'static str)],
    /// Files whose presence indicates a different platform owns this dir
    pub exclusions: &'static [&'static str],
    pub weight_multiplier: f64,
    pub default_role: PlatformRole,
}

/// The built-in signature set
pub fn builtin_signatures() -> Vec<PlatformSignature> {
    vec![
        PlatformSignature {
            platform_type: PlatformType::Nextjs,
            marker_files: &["package.json", "next.config.js"],
            content_markers: &[("package.json", "\"next\"")],
            exclusions: &[],
            weight_multiplier: 1.2,
            default_role: PlatformRole::Consumer,
        },
        PlatformSignature {
            platform_type: PlatformType::Nuxt,
            marker_files: &["package.json", "nuxt.config.ts"],
            content_markers: &[("package.json", "\"nuxt\"")],
            exclusions: &[],
            weight_multiplier: 1.2,
            default_role: PlatformRole::Consumer,
        },
        PlatformSignature {
            platform_type: PlatformType::React,
            marker_files: &["package.json"],
            content_markers: &[("package.json", "\"react\"")],
            exclusions: &["next.config.js"],
            weight_multiplier: 1.0,
            default_role: PlatformRole::Consumer,
        },
        PlatformSignature {
            platform_type: PlatformType::Vue,
            marker_files: &["package.json"],
            content_markers: &[("package.json", "\"vue\"")],
            exclusions: &["nuxt.config.ts"],
            weight_multiplier: 1.0,
            default_role: PlatformRole::Consumer,
        },
        PlatformSignature {
            platform_type: PlatformType::Angular,
            marker_files: &["package.json", "angular.json"],
            content_markers: &[("package.json", "@angular/core")],
            exclusions: &[],
            weight_multiplier: 1.1,
            default_role: PlatformRole::Consumer,
        },
        PlatformSignature {
            platform_type: PlatformType::Nodejs,
            marker_files: &["package.json"],
            content_markers: &[
                ("package.json", "\"express\""),
                ("package.json", "\"fastify\""),
            ],
            exclusions: &["next.config.js", "angular.json"],
            weight_multiplier: 0.9,
            default_role: PlatformRole::Provider,
        },
        PlatformSignature {
            platform_type: PlatformType::Django,
            marker_files: &["manage.py", "requirements.txt"],
            content_markers: &[("requirements.txt", "django")],
            exclusions: &[],
            weight_multiplier: 1.1,
            default_role: PlatformRole::Provider,
        },
        PlatformSignature {
            platform_type: PlatformType::Flask,
            marker_files: &["requirements.txt"],
            content_markers: &[("requirements.txt", "flask")],
            exclusions: &["manage.py"],
            weight_multiplier: 1.0,
            default_role: PlatformRole::Provider,
        },
        PlatformSignature {
            platform_type: PlatformType::Fastapi,
            marker_files: &["requirements.txt"],
            content_markers: &[
                ("requirements.txt", "fastapi"),
                ("pyproject.toml", "fastapi"),
            ],
            exclusions: &[],
            weight_multiplier: 1.1,
            default_role: PlatformRole::Provider,
        },
        PlatformSignature {
            platform_type: PlatformType::Python,
            marker_files: &["pyproject.toml"],
            content_markers: &[],
            exclusions: &["manage.py"],
            weight_multiplier: 0.7,
            default_role: PlatformRole::Provider,
        },
        PlatformSignature {
            platform_type: PlatformType::Rust,
            marker_files: &["Cargo.toml"],
            content_markers: &[("Cargo.toml", "[package]")],
            exclusions: &[],
            weight_multiplier: 1.0,
            default_role: PlatformRole::Provider,
        },
        PlatformSignature {
            platform_type: PlatformType::Go,
            marker_files: &["go.mod"],
            content_markers: &[("go.mod", "module ")],
            exclusions: &[],
            weight_multiplier: 1.0,
            default_role: PlatformRole::Provider,
        },
        PlatformSignature {
            platform_type: PlatformType::JavaSpring,
            marker_files: &["pom.xml"],
            content_markers: &[
                ("pom.xml", "spring-boot"),
                ("build.gradle", "org.springframework"),
            ],
            exclusions: &[],
            weight_multiplier: 1.1,
            default_role: PlatformRole::Provider,
        },
        PlatformSignature {
            platform_type: PlatformType::Ios,
            marker_files: &["Podfile", "Info.plist"],
            content_markers: &[],
            exclusions: &[],
            weight_multiplier: 1.0,
            default_role: PlatformRole::Consumer,
        },
        PlatformSignature {
            platform_type: PlatformType::Android,
            marker_files: &["AndroidManifest.xml", "build.gradle"],
            content_markers: &[("build.gradle", "com.android")],
            exclusions: &["pubspec.yaml"],
            weight_multiplier: 1.0,
            default_role: PlatformRole::Consumer,
        },
        PlatformSignature {
            platform_type: PlatformType::Flutter,
            marker_files: &["pubspec.yaml"],
            content_markers: &[("pubspec.yaml", "flutter")],
            exclusions: &[],
            weight_multiplier: 1.1,
            default_role: PlatformRole::Consumer,
        },
    ]
}
