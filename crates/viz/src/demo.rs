//! Seeded demo scene generation.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use scene_data::{
    BillboardGraphics, Cartesian3, Color, Entity, HeightReference, Property, SceneClock,
    SceneDocument, SceneTime, TimeInterval,
};

/// Length of the demo loop in seconds.
pub const DEMO_DURATION: f64 = 120.0;

/// Half-width of the square area demo entities move in, in meters.
const AREA: f64 = 150.0;

/// Builds a looping scene of `count` moving billboards.
///
/// The same seed always yields the same scene. Roughly one in five entities
/// blinks on and off, one in seven is clamped to the ground.
pub fn demo_scene(seed: u64, count: usize) -> SceneDocument {
    let mut rng = SmallRng::seed_from_u64(seed);
    let entities = (0..count).map(|i| demo_entity(&mut rng, i)).collect();

    SceneDocument {
        name: Some(format!("demo-{seed}")),
        clock: SceneClock {
            start: SceneTime::EPOCH,
            stop: Some(SceneTime::from_seconds(DEMO_DURATION)),
            multiplier: 1.0,
            looping: true,
        },
        entities,
        generated_ids: 0,
    }
}

fn demo_entity(rng: &mut SmallRng, index: usize) -> Entity {
    // Closed loop of waypoints so playback wraps without a jump
    let waypoints = rng.gen_range(3..=6);
    let first = random_point(rng);
    let mut samples: Vec<(SceneTime, Cartesian3)> = (0..waypoints)
        .map(|w| {
            let t = DEMO_DURATION * w as f64 / waypoints as f64;
            let point = if w == 0 { first } else { random_point(rng) };
            (SceneTime::from_seconds(t), point)
        })
        .collect();
    samples.push((SceneTime::from_seconds(DEMO_DURATION), first));

    let color = Color::rgb(
        rng.gen_range(0.3..1.0),
        rng.gen_range(0.3..1.0),
        rng.gen_range(0.3..1.0),
    );
    let image = if index % 2 == 0 {
        "builtin:square"
    } else {
        "builtin:diamond"
    };

    let mut billboard = BillboardGraphics::with_image(image)
        .color(Property::constant(color))
        .scale(Property::constant(rng.gen_range(0.5..2.0)));

    billboard.rotation = Some(Property::sampled([
        (SceneTime::EPOCH, 0.0),
        (
            SceneTime::from_seconds(DEMO_DURATION),
            rng.gen_range(-1.0..1.0) * std::f64::consts::TAU,
        ),
    ]));

    if index % 5 == 4 {
        // Whole seconds keep the scene file readable
        let on = rng.gen_range(10..60) as f64;
        let off = on + rng.gen_range(10..60) as f64;
        billboard = billboard.show(Property::intervals([
            (
                TimeInterval::new(SceneTime::EPOCH, SceneTime::from_seconds(on)),
                true,
            ),
            (
                TimeInterval::new(SceneTime::from_seconds(on), SceneTime::from_seconds(off)),
                false,
            ),
            (
                TimeInterval::new(
                    SceneTime::from_seconds(off),
                    SceneTime::from_seconds(DEMO_DURATION),
                ),
                true,
            ),
        ]));
    }

    if index % 7 == 6 {
        billboard = billboard.height_reference(Property::constant(HeightReference::ClampToGround));
    }

    Entity::new(format!("demo-{index:03}"))
        .with_name(format!("Demo billboard {index}"))
        .with_position(Property::sampled(samples))
        .with_billboard(billboard)
}

fn random_point(rng: &mut SmallRng) -> Cartesian3 {
    Cartesian3::new(
        rng.gen_range(-AREA..AREA),
        rng.gen_range(-AREA..AREA),
        rng.gen_range(0.0..40.0),
    )
}
