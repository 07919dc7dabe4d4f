use news_reel_publisher::image::{
    is_qualifying_image, resolve_image, ImageRequest, ImageSource, PLAYER_LIBRARY,
};
use news_reel_publisher::PipelineError;

#[test]
fn logo_is_rejected_photo_is_accepted() {
    assert!(!is_qualifying_image("https://cdn/site/logo-full.png", false));
    assert!(is_qualifying_image("https://cdn/site/photo123.jpg", false));
    assert!(!is_qualifying_image("https://cdn/site/logo-full.png", true));
    assert!(is_qualifying_image("https://cdn/site/photo123.jpg", true));
}

#[test]
fn junk_markers_cover_common_garbage() {
    for url in [
        "https://cdn.test/img/placeholder.jpg",
        "https://cdn.test/ICON/share.png",
        "https://cdn.test/u/avatar_1.jpg",
        "https://cdn.test/team-badge.png",
        "https://cdn.test/sprite.webp",
        "https://ads.test/pixel.gif?id=1",
        "https://cdn.test/16x16/x.png",
        "https://cdn.test/img_thumb.jpg",
    ] {
        assert!(!is_qualifying_image(url, false), "{url}");
    }
}

#[test]
fn strict_mode_accepts_cdn_transforms_without_extension() {
    assert!(is_qualifying_image(
        "https://res.cloudinary.com/demo/image/upload/w_800/sample",
        true
    ));
    assert!(is_qualifying_image("https://img.test/p/12345?w=1200", true));
    assert!(!is_qualifying_image("https://img.test/p/12345", true));
}

#[test]
fn library_photos_pass_strict_mode() {
    for p in PLAYER_LIBRARY {
        assert!(is_qualifying_image(p.image_url, true), "{}", p.display_name);
    }
}

#[test]
fn bad_manual_image_falls_through_to_extracted() {
    let req = ImageRequest {
        manual_override: Some("https://cdn.test/brand/logo.png"),
        extracted_primary: Some("https://cdn.test/photos/match.jpg"),
        titles: vec![],
        strict: false,
    };
    let got = resolve_image(&req).unwrap();
    assert_eq!(got.source, ImageSource::Extracted);
    assert_eq!(got.url, "https://cdn.test/photos/match.jpg");
}

#[test]
fn extracted_title_is_tried_after_candidate_title() {
    let req = ImageRequest {
        manual_override: None,
        extracted_primary: None,
        titles: vec!["Manual Request Story", "Haaland scores again"],
        strict: true,
    };
    let got = resolve_image(&req).unwrap();
    assert_eq!(
        got.source,
        ImageSource::PlayerLibrary {
            display_name: "Erling Haaland"
        }
    );
}

#[test]
fn exhausted_cascade_is_a_hard_abort() {
    let req = ImageRequest {
        manual_override: None,
        extracted_primary: Some("data:image/gif;base64,R0lGOD"),
        titles: vec!["Cricket: rain stops play"],
        strict: false,
    };
    assert!(matches!(
        resolve_image(&req),
        Err(PipelineError::NoQualifyingImage)
    ));
}
