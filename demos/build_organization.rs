use atlas::{build_organization, MemoryEmbeddings, MemoryStore, OrgConfig, EMBEDDING_DIM};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Minimal end-to-end: embeddings -> initial tree -> optimize -> label.
    //
    // Real deployments back the store with a metadata database and the
    // word table with fastText vectors; here both are synthetic.

    let mut store = MemoryStore::new();
    let mut ft = MemoryEmbeddings::new();

    // Three topical clusters on distinct axes, with a little overlap.
    let groups: &[(&str, &[(&str, &str)])] = &[
        ("weather", &[
            ("rainfall-2019", "Rainfall 2019"),
            ("rainfall-2020", "Rainfall 2020"),
            ("storm-events", "Storm Events"),
        ]),
        ("transit", &[
            ("bus-ridership", "Bus Ridership"),
            ("subway-delays", "Subway Delays"),
        ]),
        ("budget", &[
            ("city-budget", "City Budget"),
            ("school-budget", "School Budget"),
            ("parks-budget", "Parks Budget"),
        ]),
    ];

    let mut dataset_ids = Vec::new();
    for (axis, (topic, datasets)) in groups.iter().enumerate() {
        ft.insert(*topic, unit(axis));
        store.add_categories(*topic);
        for (offset, (id, name)) in datasets.iter().enumerate() {
            store.insert(*id, *name, clustered(axis, offset));
            dataset_ids.push(id.to_string());
        }
    }

    let config = OrgConfig::default()
        .with_gamma(20.0)
        .with_termination_window(16)
        .with_termination_threshold(1e-6)
        .with_max_iters(400);

    let organization = build_organization(&store, &ft, &config, &dataset_ids)?;

    println!(
        "nodes={} leaves={} effectiveness={:.6}",
        organization.node_count(),
        organization.leaves().len(),
        organization.effectiveness()
    );
    println!("{}", organization.marshal_dot());

    Ok(())
}

fn unit(axis: usize) -> Vec<f32> {
    let mut v = vec![0.0; EMBEDDING_DIM];
    v[axis] = 1.0;
    v
}

/// A unit vector near the group axis, nudged by its offset so members of
/// a group are similar but not identical.
fn clustered(axis: usize, offset: usize) -> Vec<f32> {
    let mut v = vec![0.0; EMBEDDING_DIM];
    v[axis] = 1.0;
    v[10 + offset] = 0.2;
    let norm = (1.0f32 + 0.04).sqrt();
    for x in v.iter_mut() {
        *x /= norm;
    }
    v
}
