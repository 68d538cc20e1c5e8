use super::*;
use crate::foundation::core::{ImagePayload, ResultId, SourceImage};
use std::sync::Arc;

fn result(id: u64, mime: &str, hard: Option<bool>) -> GenerationResult {
    let source = SourceImage::new("boat.photo.jpg", ImagePayload::new("image/jpeg", vec![9]));
    GenerationResult {
        id: ResultId(id),
        source: Arc::new(source),
        image: ImagePayload::new(mime, vec![id as u8; 4]),
        prompt: format!("prompt {id}"),
        bounding_box: None,
        sea_state: None,
        is_hard_example: hard,
        animation: None,
    }
}

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("sea-augment-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

#[test]
fn record_fields_follow_result_order() {
    let mut r = result(7, "image/png", Some(false));
    r.bounding_box = Some(BoundingBox([0.1, 0.2, 0.3, 0.4]));
    r.sea_state = Some(SeaState::Rough);

    let rec = AnnotationRecord::for_result(&r, 3, 100);
    assert_eq!(rec.image_file, "boat.photo_variation_3.png");
    assert_eq!(rec.original_file, "boat.photo.jpg");
    assert_eq!(rec.generation_seed, 103);
    assert_eq!(rec.is_hard_example, None);

    let json = serde_json::to_value(&rec).unwrap();
    assert_eq!(json["sea_state"], 4);
    assert_eq!(json["bounding_box"], serde_json::json!([0.1, 0.2, 0.3, 0.4]));
    assert!(json.get("is_hard_example").is_none());
}

#[test]
fn optional_fields_are_omitted() {
    let rec = AnnotationRecord::for_result(&result(1, "image/jpeg", Some(true)), 1, 0);
    let json = serde_json::to_value(&rec).unwrap();
    assert_eq!(json["image_file"], "boat.photo_variation_1.jpeg");
    assert_eq!(json["is_hard_example"], true);
    assert!(json.get("bounding_box").is_none());
    assert!(json.get("sea_state").is_none());
}

#[test]
fn export_writes_images_videos_and_manifest() {
    let dir = temp_dir("export");
    let mut animated = result(2, "image/png", None);
    animated.animation = Some(ImagePayload::new("video/mp4", vec![0, 0, 0, 24]));
    let results = vec![result(1, "image/jpeg", None), animated];

    let summary = export_dataset(&results, &dir, 42).unwrap();
    assert_eq!(summary.images, 2);
    assert_eq!(summary.animations, 1);

    assert_eq!(std::fs::read(dir.join("boat.photo_variation_1.jpeg")).unwrap(), vec![1; 4]);
    assert_eq!(std::fs::read(dir.join("boat.photo_variation_2.png")).unwrap(), vec![2; 4]);
    assert!(dir.join("boat.photo_variation_2.mp4").is_file());

    let records: Vec<AnnotationRecord> =
        serde_json::from_slice(&std::fs::read(&summary.manifest).unwrap()).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].generation_seed, 43);
    assert_eq!(records[1].prompt, "prompt 2");

    let _ = std::fs::remove_dir_all(&dir);
}
