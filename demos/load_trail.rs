//! Load a trail from a data directory and process one fix.
//!
//! Run with: cargo run --example load_trail -- <dir> <lat> <lon> [accuracy]
//!
//! The directory must contain tracks.json, stages.json and pois.json.

use std::env;
use std::process;

use trail_tracker::{format_distance, PositionFix, TrackerConfig, TrailData};

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 4 {
        eprintln!("usage: {} <dir> <lat> <lon> [accuracy]", args[0]);
        process::exit(2);
    }

    let parse = |s: &str| -> f64 {
        s.parse().unwrap_or_else(|_| {
            eprintln!("not a number: {}", s);
            process::exit(2);
        })
    };
    let lat = parse(&args[2]);
    let lon = parse(&args[3]);
    let accuracy = args.get(4).map_or(5.0, |s| parse(s));

    let data = match TrailData::from_dir(&args[1]) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("failed to load trail: {}", e);
            process::exit(1);
        }
    };
    let route_id = data.trail.route_id.clone();

    let mut processor = match data.into_processor(TrackerConfig::default()) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("invalid trail: {}", e);
            process::exit(1);
        }
    };

    println!(
        "Trail {}: {}",
        route_id,
        format_distance(Some(processor.geometry().total_length()))
    );
    for endpoint in processor.stage_endpoints() {
        println!("  marker '{}' at idx {}", endpoint.label, endpoint.idx);
    }

    match processor.process(&PositionFix::new(lat, lon, accuracy, 0)) {
        Ok(snapshot) => {
            println!(
                "\nClosest point: #{} ({})",
                snapshot.closest_idx,
                format_distance(Some(snapshot.closest_distance))
            );
            println!("Route state:   {}", snapshot.route_state);
            println!(
                "Stage:         {}",
                snapshot.current_stage.as_ref().map_or("between stages", |s| s.name.as_str())
            );
            println!("To stage end:  {}", format_distance(snapshot.distance_to_end_of_stage));
            println!(
                "To trail end:  {}",
                format_distance(Some(snapshot.distance_to_end_of_trail))
            );
            println!("Next POI:      {}", format_distance(snapshot.distance_to_next_poi()));
            println!("Markers shown: {}", snapshot.poi_deltas.to_show.len());
        }
        Err(e) => {
            eprintln!("could not process fix: {}", e);
            process::exit(1);
        }
    }
}
