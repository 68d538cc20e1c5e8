use super::*;

fn source() -> Arc<SourceImage> {
    Arc::new(SourceImage::new(
        "boat.png",
        ImagePayload::new("image/png", vec![0]),
    ))
}

fn new_result(prompt: &str) -> NewResult {
    NewResult {
        source: source(),
        image: ImagePayload::new("image/png", vec![1]),
        prompt: prompt.to_string(),
        bounding_box: None,
        sea_state: None,
        is_hard_example: None,
    }
}

#[test]
fn append_assigns_increasing_ids() {
    let store = ResultStore::new();
    let a = store.append(new_result("a"));
    let b = store.append(new_result("b"));
    assert!(a < b);
    assert_eq!(store.len(), 2);
    assert_eq!(store.get(b).unwrap().prompt, "b");
    let order: Vec<_> = store.snapshot().iter().map(|r| r.id).collect();
    assert_eq!(order, vec![a, b]);
}

#[test]
fn animation_lifecycle_is_keyed_by_id() {
    let store = ResultStore::new();
    let a = store.append(new_result("a"));
    let b = store.append(new_result("b"));

    assert!(store.begin_animation(a, "Starting..."));
    assert!(!store.begin_animation(a, "Starting..."), "second start is a no-op");
    assert!(!store.begin_animation(ResultId(999), "Starting..."));
    assert!(store.animation_status(b).is_none());

    store.update_animation(a, "Checking... (10s)");
    assert_eq!(
        store.animation_status(a).unwrap().progress_message,
        "Checking... (10s)"
    );

    store
        .attach_animation(a, ImagePayload::new("video/mp4", vec![7]))
        .unwrap();
    store.finish_animation(a, Ok("Done!".to_string()));
    let status = store.animation_status(a).unwrap();
    assert!(!status.is_running);
    assert_eq!(status.progress_message, "Done!");
    assert!(store.get(a).unwrap().animation.is_some());
    assert!(store.get(b).unwrap().animation.is_none());

    assert!(store.begin_animation(a, "Starting..."), "finished tasks can be restarted");
    store.finish_animation(a, Err("boom".to_string()));
    assert_eq!(store.animation_status(a).unwrap().error.as_deref(), Some("boom"));
}

#[test]
fn attaching_to_unknown_result_fails() {
    let store = ResultStore::new();
    let err = store
        .attach_animation(ResultId(3), ImagePayload::new("video/mp4", vec![]))
        .unwrap_err();
    assert!(err.to_string().contains("animation error:"));
}
