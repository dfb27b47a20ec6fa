//! Batch sync demo
//!
//! Batches a small scene, moves an interactor over one object for a few
//! frames and logs what lands in the instance buffer. Pass a `.toml` or
//! `.ron` path to override the batch configuration.

use instance_batch::foundation::logging;
use instance_batch::prelude::*;

struct DemoScene {
    scene: Scene,
    world: World,
    interaction: InteractionState,
    ducks: Vec<(EntityId, NodeId)>,
    hand: NodeId,
}

impl DemoScene {
    fn build() -> Self {
        let mut scene = Scene::new();
        let mut world = World::new();

        let mut ducks = Vec::new();
        for i in 0..3 {
            let root = scene.add_group(format!("duck{i}"), None);
            let mesh = scene.add_mesh("duck_body", Some(root), MeshDescriptor::opaque());
            let _ = scene.add_mesh("NavMesh", Some(root), MeshDescriptor::opaque());
            scene.set_transform(
                root,
                Transform::from_position(Vec3::new(i as f32 * 2.0, 1.0, -3.0)),
            );

            let entity = world.spawn(root);
            scene.attach_entity(root, entity);
            let _ = world.insert_component(entity, HoverableVisuals::new(0.5));
            if i == 2 {
                let _ = world.insert_component(entity, Pinnable::new(true));
            }
            ducks.push((entity, mesh));
        }

        let hand = scene.add_group("left_hand", None);
        let mut interaction = InteractionState::new();
        interaction.left_hand.object = Some(hand);

        Self {
            scene,
            world,
            interaction,
            ducks,
            hand,
        }
    }
}

fn load_config() -> Result<BatchConfig, ConfigError> {
    let config = match std::env::args().nth(1) {
        Some(path) => BatchConfig::load_from_file(&path)?,
        None => BatchConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_with_level(logging::LevelFilter::Debug);

    log::info!("Starting batch sync demo");

    let config = load_config()?;
    let manager = SlotBatchManager::from_config(&config);
    let mut controller = BatchSyncController::new(&config, manager)?;

    let mut demo = DemoScene::build();
    let roots: Vec<NodeId> = demo
        .ducks
        .iter()
        .filter_map(|(entity, _)| demo.world.object(*entity))
        .collect();
    for root in roots {
        let batched = controller.add_object(&mut demo.scene, root);
        log::info!("Batched {} meshes for {:?}", batched, root);
    }

    for frame in 0..4u8 {
        let time = f32::from(frame) / 60.0;
        let target = usize::from(frame) % demo.ducks.len();
        let (entity, _) = demo.ducks[target];

        demo.scene.set_transform(
            demo.hand,
            Transform::from_position(Vec3::new(target as f32 * 2.0, 1.2, -2.5)),
        );
        demo.scene.update_world_matrices(demo.hand);
        demo.interaction.left_hand.hovered = Some(entity);

        let context = FrameContext::new(&demo.scene, &demo.world, &demo.interaction);
        controller.tick(time, &context)?;

        let buffer = controller.buffer();
        log::info!(
            "Frame {}: time={:.3} frozen={} interactor_one={:?}",
            frame,
            buffer.time(),
            buffer.is_frozen(),
            buffer.interactor_one_pos()
        );
        for (index, (_, mesh)) in demo.ducks.iter().enumerate() {
            if let Some(slot) = controller.registry().slot_of(*mesh) {
                log::info!(
                    "  duck{} slot {}: {:?}",
                    index,
                    slot,
                    buffer.instance_sweep_params(slot)?
                );
            }
        }
    }

    for (entity, _) in &demo.ducks {
        if let Some(root) = demo.world.object(*entity) {
            let _ = controller.remove_object(&mut demo.scene, root);
        }
    }
    controller.remove();

    log::info!(
        "Demo finished, {} bytes per upload",
        controller.buffer().byte_len()
    );
    Ok(())
}
