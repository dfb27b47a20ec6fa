//! # Batch Sync Controller
//!
//! Keeps the instance buffer in step with the set of batched meshes.
//!
//! ## Lifecycle
//!
//! A mesh is either unbatched or batched. [`BatchSyncController::add_object`]
//! batches every eligible mesh under a root, [`BatchSyncController::remove_object`]
//! unbatches them again. Eligible means: a mesh, not skinned, not
//! transparent, and not named after the configured exclusion marker.
//!
//! ## Frame protocol
//!
//! ```text
//! transforms final → tick(time) → header written
//!                               → BatchManager::update
//!                                   → base record per slot
//!                                   → sweep params per slot (+ shared positions)
//!                  → upload / draw
//! ```
//!
//! `tick` must run once per frame after transforms are final and before the
//! draw. Nothing here suspends or locks.

use crate::config::BatchConfig;
use crate::ecs::components::{HoverableVisuals, Pinnable, SuperSpawner};
use crate::ecs::{EntityId, World};
use crate::foundation::math::{scale_y_of, translation_of};
use crate::input::{resolve_interactors, InteractionQuery, InteractorSource};
use crate::render::batch_manager::{BatchError, BatchManager, BatchResult, InstanceSink};
use crate::render::instance_buffer::{InstanceBufferResult, InstanceDataBuffer};
use crate::render::object_registry::ObjectRegistry;
use crate::scene::{NodeId, Scene, SceneNode};

/// Everything outside the batch a frame's writes depend on
#[derive(Clone, Copy)]
pub struct FrameContext<'a> {
    /// Scene with final world matrices for the frame
    pub scene: &'a Scene,
    /// Entities, their capabilities and the frozen flag
    pub world: &'a World,
    /// Hover/hold state of the interactors
    pub interaction: &'a dyn InteractionQuery,
}

impl<'a> FrameContext<'a> {
    /// Bundle the frame's read-only inputs
    pub fn new(scene: &'a Scene, world: &'a World, interaction: &'a dyn InteractionQuery) -> Self {
        Self {
            scene,
            world,
            interaction,
        }
    }
}

/// Vertical extent plus interactor flags for one instance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepParams {
    /// Bottom of the world-space bounding interval
    pub y_min: f32,
    /// Top of the world-space bounding interval
    pub y_max: f32,
    /// Interactor one highlights this instance
    pub interactor_one: bool,
    /// Interactor two highlights this instance
    pub interactor_two: bool,
}

impl SweepParams {
    /// Build params from the object's world Y and scaled bounding radius
    ///
    /// `hidden` suppresses both interactor flags.
    pub fn new(
        world_y: f32,
        scaled_radius: f32,
        interactor_one: bool,
        interactor_two: bool,
        hidden: bool,
    ) -> Self {
        Self {
            y_min: world_y - scaled_radius,
            y_max: world_y + scaled_radius,
            interactor_one: interactor_one && !hidden,
            interactor_two: interactor_two && !hidden,
        }
    }

    /// Shader layout: `[y_min, y_max, one, two]` with flags as 0.0/1.0
    pub fn to_array(self) -> [f32; 4] {
        [
            self.y_min,
            self.y_max,
            f32::from(u8::from(self.interactor_one)),
            f32::from(u8::from(self.interactor_two)),
        ]
    }
}

/// Pinned objects don't highlight unless they spawn copies or the scene is frozen
pub fn hide_due_to_pinning(is_spawner: bool, is_pinned: bool, is_frozen: bool) -> bool {
    !is_spawner && is_pinned && !is_frozen
}

/// Whether a scene node can share the instanced draw
pub fn is_batchable(node: &SceneNode, excluded_mesh_name: &str) -> bool {
    node.mesh()
        .is_some_and(|mesh| !mesh.skinned && !mesh.transparent && node.name != excluded_mesh_name)
}

/// Drives instance buffer writes from scene and interaction state
pub struct BatchSyncController<B: BatchManager> {
    buffer: InstanceDataBuffer,
    batch_manager: B,
    registry: ObjectRegistry,
    excluded_mesh_name: String,
}

impl<B: BatchManager> BatchSyncController<B> {
    /// Create a controller and its instance buffer
    pub fn new(config: &BatchConfig, batch_manager: B) -> BatchResult<Self> {
        let buffer = InstanceDataBuffer::from_config(config)?;
        if batch_manager.base_record_bytes() != config.base_record_bytes {
            return Err(BatchError::LayoutMismatch {
                manager: batch_manager.base_record_bytes(),
                buffer: config.base_record_bytes,
            });
        }

        Ok(Self {
            buffer,
            batch_manager,
            registry: ObjectRegistry::new(),
            excluded_mesh_name: config.excluded_mesh_name.clone(),
        })
    }

    /// The instance buffer, for upload
    pub fn buffer(&self) -> &InstanceDataBuffer {
        &self.buffer
    }

    /// The wrapped batch manager
    pub fn batch_manager(&self) -> &B {
        &self.batch_manager
    }

    /// Batched meshes and their owners
    pub fn registry(&self) -> &ObjectRegistry {
        &self.registry
    }

    /// Whether `mesh` is currently batched through this controller
    pub fn is_tracked(&self, mesh: NodeId) -> bool {
        self.registry.contains(mesh)
    }

    /// Number of meshes batched through this controller
    pub fn tracked_count(&self) -> usize {
        self.registry.len()
    }

    fn batchable_meshes(&self, scene: &Scene, root: NodeId) -> Vec<NodeId> {
        let mut meshes = Vec::new();
        scene.traverse(root, |id, node| {
            if is_batchable(node, &self.excluded_mesh_name) {
                meshes.push(id);
            }
        });
        meshes
    }

    /// Batch every eligible mesh under `root`
    ///
    /// Meshes the batch manager refuses stay unbatched. Returns how many
    /// meshes were batched.
    pub fn add_object(&mut self, scene: &mut Scene, root: NodeId) -> usize {
        scene.update_world_matrices(root);

        let mut batched = 0;
        for mesh in self.batchable_meshes(scene, root) {
            if !self.batch_manager.add_mesh(scene, mesh) {
                continue;
            }
            scene.set_batched(mesh, true);
            let slot = self.batch_manager.slot_of(mesh);
            if let Some(slot) = slot {
                self.clear_slot(slot);
            }
            self.registry.insert(mesh, scene.owning_entity(mesh), slot);
            batched += 1;
        }

        log::debug!("Batched {} meshes under {:?}", batched, root);
        batched
    }

    /// Unbatch every eligible mesh under `root`
    ///
    /// Safe to repeat. Returns how many tracked meshes were released.
    pub fn remove_object(&mut self, scene: &mut Scene, root: NodeId) -> usize {
        let mut released = 0;
        for mesh in self.batchable_meshes(scene, root) {
            self.release_mesh(mesh);
            scene.set_batched(mesh, false);
            if self.registry.remove(mesh).is_some() {
                released += 1;
            }
        }

        log::debug!("Unbatched {} meshes under {:?}", released, root);
        released
    }

    /// Release slots held by meshes that left the scene without being unbatched
    pub fn release_stale(&mut self, scene: &Scene) -> usize {
        let stale = self.registry.stale_meshes(scene);
        for mesh in &stale {
            self.release_mesh(*mesh);
            let _ = self.registry.remove(*mesh);
        }
        if !stale.is_empty() {
            log::debug!("Released {} stale batched meshes", stale.len());
        }
        stale.len()
    }

    /// Hand a mesh's slot back to the batch manager and blank its sweep params
    fn release_mesh(&mut self, mesh: NodeId) {
        let slot = self.batch_manager.slot_of(mesh);
        self.batch_manager.remove_mesh(mesh);
        if let Some(slot) = slot {
            self.clear_slot(slot);
        }
    }

    /// Zero a slot's sweep params so a reused slot starts unhighlighted
    fn clear_slot(&mut self, slot: usize) {
        debug_assert!(
            slot < self.buffer.capacity(),
            "batch manager assigned slot {slot} past capacity {}",
            self.buffer.capacity()
        );
        if let Err(err) = self.buffer.clear_instance(slot) {
            log::error!("Failed to clear instance slot: {}", err);
        }
    }

    /// Per-frame update
    ///
    /// Writes the shared header, then lets the batch manager walk its slots,
    /// which calls back into the extension writes for each instance.
    ///
    /// World matrices are read as cached. Call
    /// [`Scene::update_world_matrices`] for anything moved this frame before
    /// ticking, or the previous frame's transforms are uploaded.
    pub fn tick(&mut self, time: f32, frame: &FrameContext<'_>) -> BatchResult<()> {
        self.buffer.set_time(time);
        self.buffer.set_frozen(frame.world.is_frozen());

        let mut writer = InstanceWriter {
            buffer: &mut self.buffer,
            registry: &mut self.registry,
            frame,
        };
        self.batch_manager.update(time, frame.scene, &mut writer)
    }

    /// Lifecycle hook; batched meshes are left as they are
    pub fn remove(&mut self) {
        log::debug!(
            "Batch sync controller removed with {} meshes still batched",
            self.registry.len()
        );
    }
}

/// Per-frame [`InstanceSink`] borrowing the controller's buffer and registry
struct InstanceWriter<'w, 'f> {
    buffer: &'w mut InstanceDataBuffer,
    registry: &'w mut ObjectRegistry,
    frame: &'w FrameContext<'f>,
}

impl InstanceWriter<'_, '_> {
    fn interactor_position(&self, source: Option<InteractorSource>) -> Option<[f32; 3]> {
        let object = self.frame.interaction.interactor_object(source?)?;
        let world = self.frame.scene.world_matrix(object)?;
        Some(translation_of(world).into())
    }

    fn write_extension(&mut self, slot: usize, entity: EntityId) -> InstanceBufferResult<()> {
        let FrameContext { scene, world, interaction } = *self.frame;

        let Some(visuals) = world.component::<HoverableVisuals>(entity) else {
            return Ok(());
        };
        let Some(matrix) = world.object(entity).and_then(|object| scene.world_matrix(object)) else {
            return Ok(());
        };

        let world_y = translation_of(matrix).y;
        let scaled_radius = scale_y_of(matrix) * visuals.bounding_radius;

        let is_pinned = world.component::<Pinnable>(entity).is_some_and(|p| p.pinned);
        let is_spawner = world.has_component::<SuperSpawner>(entity);
        let hidden = hide_due_to_pinning(is_spawner, is_pinned, world.is_frozen());

        let interactors = resolve_interactors(interaction, entity);
        let params = SweepParams::new(
            world_y,
            scaled_radius,
            interactors.one.is_some(),
            interactors.two.is_some(),
            hidden,
        );

        let interactor_one_pos = self.interactor_position(interactors.one);
        let interactor_two_pos = self.interactor_position(interactors.two);

        log::trace!("Slot {} sweep params {:?}", slot, params);
        self.buffer
            .write_instance_attributes(slot, params.to_array(), interactor_one_pos, interactor_two_pos)
    }
}

impl InstanceSink for InstanceWriter<'_, '_> {
    fn base_record_mut(&mut self, slot: usize) -> InstanceBufferResult<&mut [u8]> {
        self.buffer.base_record_mut(slot)
    }

    fn instance_updated(&mut self, slot: usize, mesh: NodeId) -> InstanceBufferResult<()> {
        debug_assert!(
            slot < self.buffer.capacity(),
            "batch manager reported slot {slot} past capacity {}",
            self.buffer.capacity()
        );
        self.registry.assign_slot(mesh, slot);

        match self.registry.resolve_owner(mesh, self.frame.scene, self.frame.world) {
            Some(entity) => self.write_extension(slot, entity),
            None => Ok(()),
        }
    }
}
