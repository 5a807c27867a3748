//! Walk a simulated user along a synthetic two-stage trail.
//!
//! Run with: cargo run --example simulated_walk

use trail_tracker::{
    format_distance, GpsPoint, LocationProcessor, Poi, PoiCatalog, SimulatedWalk, Stage,
    StageIndex, TrackerConfig, TrailGeometry, BAILOUT_TYPE,
};

fn stage(id: &str, name: &str, start_idx: u32, end_idx: u32, end_label: &str) -> Stage {
    Stage {
        id: id.to_string(),
        name: name.to_string(),
        start_idx,
        end_idx,
        end_label: end_label.to_string(),
    }
}

fn main() {
    // ~11km heading south, one point every ~111m
    let geometry = TrailGeometry::new(
        (0..100)
            .map(|i| GpsPoint::new(51.2147 - i as f64 * 0.001, 3.6220))
            .collect(),
    );

    let stages = StageIndex::new(
        vec![
            stage("S01", "Start → Mill", 0, 49, "Mill"),
            stage("S02", "Mill → Abbey", 50, 99, "Abbey"),
        ],
        geometry.len(),
    )
    .expect("valid stages");

    let pois = PoiCatalog::new(vec![
        Poi::new(None, "water", "Fountain", 51.1947, 3.6221, None),
        Poi::new(None, "cafe", "Mill café", 51.1657, 3.6219, None),
        Poi::new(None, BAILOUT_TYPE, "Bus stop", 51.1347, 3.6240, None),
    ]);

    let mut processor = LocationProcessor::new(geometry, stages, pois, TrackerConfig::default());

    // Drift south, one fix every 500ms, slightly east of the trail
    let walk = SimulatedWalk::new(51.2147, 3.6221, 0).with_step(-0.0005, 0.00001);

    println!("Simulated walk\n");
    for fix in walk.take(40).step_by(4) {
        let snapshot = match processor.process(&fix) {
            Ok(s) => s,
            Err(e) => {
                println!("  error: {}", e);
                continue;
            }
        };

        println!(
            "t={:>5}ms idx={:>2} {:<10} stage={:<4} stage end {:>7} | trail end {:>7} | next: {}",
            snapshot.timestamp,
            snapshot.closest_idx,
            snapshot.route_state.to_string(),
            snapshot.current_stage.as_ref().map_or("-", |s| s.id.as_str()),
            format_distance(snapshot.distance_to_end_of_stage),
            format_distance(Some(snapshot.distance_to_end_of_trail)),
            snapshot.next_poi.as_ref().map_or("none".to_string(), |n| format!(
                "{} in {}",
                n.poi.name,
                format_distance(Some(n.distance))
            )),
        );

        for poi in &snapshot.poi_deltas.to_show {
            println!("    + marker {}", poi.name);
        }
        for poi in &snapshot.poi_deltas.to_hide {
            println!("    - marker {}", poi.name);
        }
    }
}
