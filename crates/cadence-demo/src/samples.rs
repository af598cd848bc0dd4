//! Built-in timelines played when no timeline file is given.

use cadence_engine::{
    CompositionOptions, Easing, Keyframe, LoopCount, LoopMode, Result, Timeline,
    TimelineOptions, composer,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sample {
    /// Opacity ramp.
    Fade,
    /// Position bounce, alternating forever.
    Bounce,
    /// Fade-in followed by a slide, repeated twice.
    Intro,
}

impl Sample {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "fade" => Some(Self::Fade),
            "bounce" => Some(Self::Bounce),
            "intro" => Some(Self::Intro),
            _ => None,
        }
    }

    pub fn build(self, easing: &Easing) -> Result<Timeline> {
        match self {
            Self::Fade => fade(500, easing),
            Self::Bounce => Timeline::construct(
                TimelineOptions::new(800)
                    .id("bounce")
                    .keyframe(Keyframe::new(0.0).set("position", [0.0, 0.0]))
                    .keyframe(
                        Keyframe::new(0.6)
                            .set("position", [0.0, 120.0])
                            .with_easing(Easing::EaseIn),
                    )
                    .keyframe(Keyframe::new(1.0).set("position", [0.0, 100.0]))
                    .easing(easing.clone())
                    .loop_mode(LoopMode::Alternate)
                    .loop_count(LoopCount::Infinite),
            ),
            Self::Intro => {
                let slide = Timeline::construct(
                    TimelineOptions::new(700)
                        .keyframe(Keyframe::new(0.0).set("opacity", 1.0).set("x", -40.0))
                        .keyframe(Keyframe::new(1.0).set("opacity", 1.0).set("x", 0.0))
                        .easing(Easing::cubic_bezier(0.25, 0.1, 0.25, 1.0)?),
                )?;
                let options = CompositionOptions::default().with_id("intro");
                let intro = composer::sequence(&[fade(300, easing)?, slide], &options)?;
                composer::repeat(&intro, LoopCount::Times(2))
            }
        }
    }
}

fn fade(duration: u64, easing: &Easing) -> Result<Timeline> {
    Timeline::construct(
        TimelineOptions::new(duration)
            .id("fade")
            .keyframe(Keyframe::new(0.0).set("opacity", 0.0).set("x", -40.0))
            .keyframe(Keyframe::new(1.0).set("opacity", 1.0).set("x", -40.0))
            .easing(easing.clone()),
    )
}
