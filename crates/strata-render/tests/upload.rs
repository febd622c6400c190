use strata_blocks::RenderGroup;
use strata_geom::{Frustum, Mat4, Vec3};
use strata_mesh_cpu::MeshPacket;
use strata_render::{
    BufferUsage, GpuBackend, GpuBuffer, GpuError, HeadlessBackend, QuadIndex, RenderTable,
    VisibilityCuller,
};
use strata_world::ChunkCoord;

fn packet(coord: ChunkCoord, quads: [usize; 3]) -> MeshPacket {
    let mut p = MeshPacket::new(coord);
    for group in RenderGroup::ALL {
        let mb = p.group_mut(group);
        for q in 0..quads[group.index()] {
            let o = Vec3::new(q as f32, 0.0, 0.0);
            let vs = [
                o,
                o + Vec3::new(1.0, 0.0, 0.0),
                o + Vec3::new(1.0, 0.0, 1.0),
                o + Vec3::new(0.0, 0.0, 1.0),
            ];
            mb.add_quad(vs, Vec3::UP, [1.0; 4], [(0.0, 0.0); 4]);
        }
    }
    p
}

fn everything_visible() -> Frustum {
    let eye = Vec3::new(8.0, 200.0, 8.0);
    let view = Mat4::look_at(eye, Vec3::new(8.0, 0.0, 8.01), Vec3::UP);
    let proj = Mat4::perspective(2.5, 1.0, 0.1, 1000.0);
    Frustum::from_view_proj(&(proj * view))
}

#[test]
fn first_upload_is_static_and_rebuild_streams_in_place() {
    let mut gpu = HeadlessBackend::new();
    let mut table = RenderTable::new();
    let c = ChunkCoord::new(0, 0, 0);
    table.upload(&mut gpu, &packet(c, [10, 0, 0]), 64).unwrap();
    let id = table.get(c).unwrap().parts(RenderGroup::Terrain)[0].id();
    assert_eq!(gpu.vertex_buffer(id).unwrap().usage, BufferUsage::Static);

    table.upload(&mut gpu, &packet(c, [8, 0, 0]), 64).unwrap();
    let part = &table.get(c).unwrap().parts(RenderGroup::Terrain)[0];
    assert_eq!(part.id(), id);
    assert_eq!(part.quads(), 8);
    assert_eq!(gpu.vertex_buffer(id).unwrap().updates, 1);
    assert_eq!(gpu.counters().vertex_created, 1);

    // Growing past the old capacity needs a fresh stream buffer.
    table.upload(&mut gpu, &packet(c, [12, 0, 0]), 64).unwrap();
    let part = &table.get(c).unwrap().parts(RenderGroup::Terrain)[0];
    assert_ne!(part.id(), id);
    assert_eq!(gpu.vertex_buffer(part.id()).unwrap().usage, BufferUsage::Stream);
    assert_eq!(gpu.live_vertex_buffers(), 1);
    table.dispose_all(&mut gpu);
    assert_eq!(gpu.invalid_deletes(), 0);
}

#[test]
fn chunk_reloaded_after_eviction_starts_static() {
    let mut gpu = HeadlessBackend::new();
    let mut table = RenderTable::new();
    let c = ChunkCoord::new(2, 0, 0);
    table.upload(&mut gpu, &packet(c, [6, 0, 0]), 64).unwrap();
    table.upload(&mut gpu, &packet(c, [7, 0, 0]), 64).unwrap();
    assert!(table.evict(&mut gpu, c));

    table.upload(&mut gpu, &packet(c, [5, 0, 0]), 64).unwrap();
    let id = table.get(c).unwrap().parts(RenderGroup::Terrain)[0].id();
    assert_eq!(gpu.vertex_buffer(id).unwrap().usage, BufferUsage::Static);
    table.dispose_all(&mut gpu);
    assert_eq!(gpu.invalid_deletes(), 0);
}

#[test]
fn oversized_groups_are_split() {
    let mut gpu = HeadlessBackend::new();
    let mut table = RenderTable::new();
    let c = ChunkCoord::new(1, 0, 0);
    table.upload(&mut gpu, &packet(c, [25, 3, 0]), 10).unwrap();
    let render = table.get(c).unwrap();
    let quads: Vec<usize> = render
        .parts(RenderGroup::Terrain)
        .iter()
        .map(GpuBuffer::quads)
        .collect();
    assert_eq!(quads, vec![10, 10, 5]);
    assert_eq!(render.parts(RenderGroup::Plant).len(), 1);
    assert_eq!(render.quad_count(), 28);
    table.dispose_all(&mut gpu);
}

#[test]
fn emptied_groups_and_chunks_release_their_buffers() {
    let mut gpu = HeadlessBackend::new();
    let mut table = RenderTable::new();
    let c = ChunkCoord::new(0, 1, 0);
    table.upload(&mut gpu, &packet(c, [4, 2, 1]), 64).unwrap();
    assert_eq!(gpu.live_vertex_buffers(), 3);
    table.upload(&mut gpu, &packet(c, [4, 0, 0]), 64).unwrap();
    assert_eq!(gpu.live_vertex_buffers(), 1);
    assert!(table.get(c).unwrap().parts(RenderGroup::Plant).is_empty());
    table.upload(&mut gpu, &packet(c, [0, 0, 0]), 64).unwrap();
    assert!(!table.contains(c));
    assert_eq!(gpu.live_vertex_buffers(), 0);
    assert_eq!(gpu.invalid_deletes(), 0);
}

#[test]
fn eviction_disposes_exactly_once() {
    let mut gpu = HeadlessBackend::new();
    let mut table = RenderTable::new();
    for x in 0..4 {
        table
            .upload(&mut gpu, &packet(ChunkCoord::new(x, 0, 0), [3, 1, 0]), 64)
            .unwrap();
    }
    let evicted = table.evict_where(&mut gpu, |c| c.cx >= 2);
    assert_eq!(evicted.len(), 2);
    assert!(!table.evict(&mut gpu, ChunkCoord::new(3, 0, 0)));
    assert_eq!(gpu.live_vertex_buffers(), 4);
    assert_eq!(gpu.counters().vertex_deleted, 4);
    table.dispose_all(&mut gpu);
    assert_eq!(gpu.live_vertex_buffers(), 0);
    assert_eq!(gpu.invalid_deletes(), 0);
}

#[test]
fn double_dispose_is_ignored() {
    let mut gpu = HeadlessBackend::new();
    let mut buf = GpuBuffer::upload(&mut gpu, &[0.0; 24], 1, BufferUsage::Static).unwrap();
    buf.dispose(&mut gpu);
    buf.dispose(&mut gpu);
    assert!(buf.is_disposed());
    assert_eq!(gpu.counters().vertex_deleted, 1);
    assert_eq!(gpu.invalid_deletes(), 0);
}

#[test]
fn draw_visits_groups_in_order() {
    let mut gpu = HeadlessBackend::new();
    let index = QuadIndex::new(&mut gpu, 64).unwrap();
    let mut table = RenderTable::new();
    table
        .upload(&mut gpu, &packet(ChunkCoord::new(0, 0, 0), [2, 1, 1]), 64)
        .unwrap();
    table
        .upload(&mut gpu, &packet(ChunkCoord::new(0, 0, 1), [1, 0, 3]), 64)
        .unwrap();
    let vp = Mat4::IDENTITY;
    gpu.begin_frame(&vp);
    let stats = table.draw(
        &mut gpu,
        &index,
        &everything_visible(),
        &VisibilityCuller::new(true),
    );
    assert_eq!(stats.visible_chunks, 2);
    assert_eq!(stats.draw_calls, 5);
    assert_eq!(stats.quads, 8);
    let groups: Vec<RenderGroup> = gpu.draws().iter().map(|d| d.group).collect();
    let mut sorted = groups.clone();
    sorted.sort();
    assert_eq!(groups, sorted);
    assert!(gpu.draws().iter().all(|d| d.index == index.id()));
    let mut index = index;
    index.dispose(&mut gpu);
    table.dispose_all(&mut gpu);
    assert_eq!(gpu.live_index_buffers(), 0);
}

#[test]
fn allocation_failure_surfaces_as_error() {
    let mut gpu = HeadlessBackend::with_vertex_budget(24 * 5);
    let mut table = RenderTable::new();
    let err = table
        .upload(&mut gpu, &packet(ChunkCoord::new(0, 0, 0), [10, 0, 0]), 64)
        .unwrap_err();
    assert!(matches!(err, GpuError::Allocation { .. }));
    assert!(!table.contains(ChunkCoord::new(0, 0, 0)));
    assert_eq!(gpu.live_vertex_buffers(), 0);
}
