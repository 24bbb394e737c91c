//! Caption keyword routing.

use polybot_imgproc::{ImageConfig, Transform};

/// Keywords in the order their transforms run.
pub const KEYWORDS: [&str; 6] = [
    "concat",
    "contour",
    "rotate",
    "segment",
    "salt and pepper",
    "blur",
];

/// Every transform whose keyword appears in `caption`, case-insensitively.
///
/// Each match is an independent run on freshly loaded photos; the results are
/// not chained.
pub fn route_caption(caption: &str, config: &ImageConfig) -> Vec<Transform> {
    let lowered = caption.to_lowercase();
    KEYWORDS
        .iter()
        .filter(|kw| lowered.contains(*kw))
        .map(|kw| transform_for(kw, config))
        .collect()
}

fn transform_for(keyword: &str, config: &ImageConfig) -> Transform {
    match keyword {
        "concat" => Transform::Concat(config.concat_direction),
        "contour" => Transform::Contour,
        "rotate" => Transform::Rotate(config.rotate_mode),
        "segment" => Transform::Segment,
        "salt and pepper" => Transform::SaltAndPepper,
        _ => Transform::Blur {
            level: config.blur_level,
        },
    }
}

pub fn usage_hint() -> String {
    format!(
        "Please use one of the following captions to alter the picture: {}.",
        KEYWORDS.join(", ")
    )
}
