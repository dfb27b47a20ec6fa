//! End-to-end batching: add an object, run frames, remove it again.

use instance_batch::prelude::*;
use instance_batch::render::instance_buffer::{EXTENSION_RECORD_BYTES, SHARED_HEADER_BYTES};

struct Setup {
    scene: Scene,
    world: World,
    interaction: InteractionState,
    controller: BatchSyncController<SlotBatchManager>,
}

fn setup(capacity: usize) -> Setup {
    let config = BatchConfig::with_max_instances(capacity);
    let manager = SlotBatchManager::from_config(&config);
    Setup {
        scene: Scene::new(),
        world: World::new(),
        interaction: InteractionState::new(),
        controller: BatchSyncController::new(&config, manager).unwrap(),
    }
}

fn tick(setup: &mut Setup, time: f32) {
    let frame = FrameContext::new(&setup.scene, &setup.world, &setup.interaction);
    setup.controller.tick(time, &frame).unwrap();
}

#[test]
fn add_and_remove_object_with_excluded_mesh() {
    let mut s = setup(16);
    let root = s.scene.add_group("building", None);
    let walls = s.scene.add_mesh("walls", Some(root), MeshDescriptor::opaque());
    let floor = s.scene.add_mesh("floor", Some(root), MeshDescriptor::opaque());
    let nav = s.scene.add_mesh("NavMesh", Some(root), MeshDescriptor::opaque());

    assert_eq!(s.controller.add_object(&mut s.scene, root), 2);
    assert_eq!(s.controller.batch_manager().instance_count(), 2);
    assert_eq!(s.controller.tracked_count(), 2);
    assert!(s.scene.node(walls).unwrap().is_batched());
    assert!(!s.scene.node(nav).unwrap().is_batched());

    tick(&mut s, 0.0);
    let walls_slot = s.controller.registry().slot_of(walls).unwrap();
    let floor_slot = s.controller.registry().slot_of(floor).unwrap();
    assert_ne!(walls_slot, floor_slot);

    s.controller.remove_object(&mut s.scene, root);
    for mesh in [walls, floor, nav] {
        assert!(!s.scene.node(mesh).unwrap().is_batched());
        assert!(!s.controller.is_tracked(mesh));
    }
    assert_eq!(s.controller.batch_manager().instance_count(), 0);

    s.controller.remove_object(&mut s.scene, root);
    assert_eq!(s.controller.tracked_count(), 0);
    s.controller.remove();
}

#[test]
fn buffer_size_is_independent_of_batched_count() {
    let s = setup(8);
    assert_eq!(
        s.controller.buffer().byte_len(),
        8 * (112 + EXTENSION_RECORD_BYTES) + SHARED_HEADER_BYTES
    );
}

#[test]
fn held_object_highlights_and_broadcasts_position() {
    let mut s = setup(4);
    let root = s.scene.add_group("duck", None);
    let mesh = s.scene.add_mesh("duck_mesh", Some(root), MeshDescriptor::opaque());
    s.scene
        .set_transform(root, Transform::from_position(Vec3::new(0.0, 1.0, 0.0)));
    let duck = s.world.spawn(root);
    s.scene.attach_entity(root, duck);
    let _ = s.world.insert_component(duck, HoverableVisuals::new(0.5));
    assert_eq!(s.controller.add_object(&mut s.scene, root), 1);

    let hand = s.scene.add_group("left_hand", None);
    s.scene
        .set_transform(hand, Transform::from_position(Vec3::new(-1.0, 1.5, 0.2)));
    s.scene.update_world_matrices(hand);
    s.interaction.left_hand.object = Some(hand);
    s.interaction.left_hand.held = Some(duck);

    tick(&mut s, 3.0);

    let slot = s.controller.registry().slot_of(mesh).unwrap();
    let buffer = s.controller.buffer();
    assert_eq!(buffer.instance_sweep_params(slot).unwrap(), [0.5, 1.5, 1.0, 0.0]);
    assert_eq!(buffer.interactor_one_pos(), &[-1.0, 1.5, 0.2]);
    assert_eq!(buffer.time(), 3.0);

    s.interaction.left_hand.held = None;
    tick(&mut s, 3.1);
    let buffer = s.controller.buffer();
    assert_eq!(buffer.instance_sweep_params(slot).unwrap(), [0.5, 1.5, 0.0, 0.0]);
    // Positions persist until another instance overwrites them.
    assert_eq!(buffer.interactor_one_pos(), &[-1.0, 1.5, 0.2]);
}
