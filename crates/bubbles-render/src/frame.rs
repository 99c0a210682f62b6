//! Per-frame drawing of the shared canvas.
//!
//! Every frame walks the engine's peer snapshot once, drawing one bubble per
//! remote participant, then draws the local cursor on top.

use bubbles_core::config::CanvasConfig;
use bubbles_core::engine::{PlotSession, PlotSource};
use bubbles_core::transform::{CoordinateTransform, LogicalPoint, TransformError, unpack_rgb};
use thiserror::Error;

use crate::renderer::{Bubble, BubbleKind, RenderContext, Renderer};

/// Frame errors.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum FrameError {
    #[error("Invalid viewport: {0}")]
    InvalidExtent(#[from] TransformError),
    #[error("Peer enumeration did not finish within {limit} peers")]
    EnumerationOverrun { limit: usize },
}

/// Outcome of one drawn frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub peers_drawn: usize,
    /// Set when the enumeration was cut short by the fuse.
    pub overrun: Option<FrameError>,
}

/// Draws frames from a [`PlotSource`] onto a [`Renderer`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRenderer {
    transform: CoordinateTransform,
    local_diameter: f64,
    remote_diameter: f64,
    stroke_width: f64,
    plot_fuse: usize,
}

impl Default for FrameRenderer {
    fn default() -> Self {
        let canvas = CanvasConfig::default();
        Self {
            transform: CoordinateTransform::new(),
            local_diameter: canvas.local_diameter,
            remote_diameter: canvas.remote_diameter,
            stroke_width: canvas.stroke_width,
            plot_fuse: canvas.plot_fuse,
        }
    }
}

impl FrameRenderer {
    /// Build a frame renderer from the canvas configuration.
    pub fn from_config(canvas: &CanvasConfig) -> Result<Self, TransformError> {
        Ok(Self {
            transform: canvas.transform()?,
            local_diameter: canvas.local_diameter,
            remote_diameter: canvas.remote_diameter,
            stroke_width: canvas.stroke_width,
            plot_fuse: canvas.plot_fuse.max(1),
        })
    }

    /// Set the enumeration fuse.
    pub fn with_fuse(mut self, fuse: usize) -> Self {
        self.plot_fuse = fuse.max(1);
        self
    }

    pub fn transform(&self) -> &CoordinateTransform {
        &self.transform
    }

    pub fn plot_fuse(&self) -> usize {
        self.plot_fuse
    }

    /// Draw one frame.
    ///
    /// An invalid viewport fails before the engine is touched. An overrun is
    /// not an error: the local cursor is still drawn and the overrun is
    /// returned in the report.
    pub fn render<P, R>(
        &self,
        source: &mut P,
        local: LogicalPoint,
        ctx: &RenderContext,
        renderer: &mut R,
    ) -> Result<FrameReport, FrameError>
    where
        P: PlotSource + ?Sized,
        R: Renderer + ?Sized,
    {
        let viewport = ctx.viewport;
        self.transform.check_viewport(viewport)?;
        renderer.begin_frame(ctx);

        let mut peers_drawn = 0;
        let mut overrun = None;
        let local_color = {
            let mut session = PlotSession::begin(source);
            let local_color = session.my_color();
            while !session.is_finished() {
                if peers_drawn >= self.plot_fuse {
                    overrun = Some(FrameError::EnumerationOverrun {
                        limit: self.plot_fuse,
                    });
                    break;
                }
                let peer = session.current();
                renderer.draw_bubble(&Bubble {
                    kind: BubbleKind::Remote,
                    center: self.transform.logical_to_screen(peer.position, viewport)?,
                    diameter: self.remote_diameter,
                    color: unpack_rgb(peer.color),
                    stroke_width: self.stroke_width,
                });
                peers_drawn += 1;
                session.advance();
            }
            local_color
        };

        if let Some(err) = overrun {
            log::warn!("Frame cut short: {}", err);
        }

        renderer.draw_bubble(&Bubble {
            kind: BubbleKind::Local,
            center: self.transform.logical_to_screen(local, viewport)?,
            diameter: self.local_diameter,
            color: unpack_rgb(local_color),
            stroke_width: self.stroke_width,
        });

        Ok(FrameReport {
            peers_drawn,
            overrun,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::RecordingRenderer;
    use bubbles_core::config::DEFAULT_PLOT_FUSE;
    use bubbles_core::engine::RemotePeer;
    use kurbo::{Point, Rect, Size};

    /// Plot source whose enumeration can be made to never finish.
    #[derive(Default)]
    struct ScriptedSource {
        peers: Vec<RemotePeer>,
        index: usize,
        stuck: bool,
        starts: usize,
        dones: usize,
    }

    impl PlotSource for ScriptedSource {
        fn plot_start(&mut self) {
            self.index = 0;
            self.starts += 1;
        }
        fn plot_end(&self) -> bool {
            !self.stuck && self.index >= self.peers.len()
        }
        fn plot_next(&mut self) {
            self.index += 1;
        }
        fn plot_x(&self) -> i32 {
            self.peers[self.index % self.peers.len()].position.x
        }
        fn plot_y(&self) -> i32 {
            self.peers[self.index % self.peers.len()].position.y
        }
        fn plot_color(&self) -> u32 {
            self.peers[self.index % self.peers.len()].color
        }
        fn plot_my_color(&self) -> u32 {
            0x336699
        }
        fn plot_done(&mut self) {
            self.dones += 1;
        }
    }

    fn three_peers() -> Vec<RemotePeer> {
        vec![
            RemotePeer { position: LogicalPoint::new(0, 0), color: 0xff0000 },
            RemotePeer { position: LogicalPoint::new(-150, -300), color: 0x00ff00 },
            RemotePeer { position: LogicalPoint::new(10_000, 10_000), color: 0x0000ff },
        ]
    }

    fn ctx() -> RenderContext {
        RenderContext::new(Rect::new(0.0, 0.0, 300.0, 600.0))
    }

    #[test]
    fn test_draws_peers_then_local() {
        let mut source = ScriptedSource { peers: three_peers(), ..Default::default() };
        let mut renderer = RecordingRenderer::new();

        let report = FrameRenderer::default()
            .render(&mut source, LogicalPoint::new(-30, -100), &ctx(), &mut renderer)
            .unwrap();

        assert_eq!(report, FrameReport { peers_drawn: 3, overrun: None });
        let bubbles = renderer.bubbles();
        assert_eq!(bubbles.len(), 4);
        assert_eq!(bubbles[0].center, Point::new(150.0, 300.0));
        assert_eq!(bubbles[1].center, Point::new(0.0, 0.0));
        // Off-canvas peers are drawn anyway.
        assert_eq!(bubbles[2].center, Point::new(10_150.0, 10_300.0));
        assert_eq!(bubbles[2].diameter, 20.0);

        let local = &bubbles[3];
        assert_eq!(local.kind, BubbleKind::Local);
        assert_eq!(local.center, Point::new(120.0, 200.0));
        assert_eq!(local.diameter, 40.0);
        assert_eq!(local.color, unpack_rgb(0x336699));
        assert_eq!((source.starts, source.dones), (1, 1));
    }

    #[test]
    fn test_stuck_enumeration_hits_fuse() {
        let mut source = ScriptedSource { peers: three_peers(), stuck: true, ..Default::default() };
        let mut renderer = RecordingRenderer::new();

        let report = FrameRenderer::default()
            .with_fuse(5)
            .render(&mut source, LogicalPoint::ORIGIN, &ctx(), &mut renderer)
            .unwrap();

        assert_eq!(report.peers_drawn, 5);
        assert_eq!(report.overrun, Some(FrameError::EnumerationOverrun { limit: 5 }));
        assert_eq!(renderer.remotes().count(), 5);
        assert!(renderer.local().is_some());
        assert_eq!((source.starts, source.dones), (1, 1));
    }

    #[test]
    fn test_endless_enumeration_stops_at_default_fuse() {
        let mut source = ScriptedSource { peers: three_peers(), stuck: true, ..Default::default() };
        let mut renderer = RecordingRenderer::new();

        let report = FrameRenderer::default()
            .render(&mut source, LogicalPoint::new(-30, -100), &ctx(), &mut renderer)
            .unwrap();

        assert_eq!(report.peers_drawn, DEFAULT_PLOT_FUSE);
        assert_eq!(
            report.overrun,
            Some(FrameError::EnumerationOverrun { limit: DEFAULT_PLOT_FUSE })
        );
        assert_eq!(renderer.remotes().count(), DEFAULT_PLOT_FUSE);
        // The first three are the real peers, in order.
        let first: Vec<Point> = renderer.remotes().take(3).map(|b| b.center).collect();
        assert_eq!(
            first,
            vec![Point::new(150.0, 300.0), Point::new(0.0, 0.0), Point::new(10_150.0, 10_300.0)]
        );
        let local = renderer.bubbles().last().unwrap();
        assert_eq!(local.kind, BubbleKind::Local);
        assert_eq!(local.center, Point::new(120.0, 200.0));
        assert_eq!(local.color, unpack_rgb(0x336699));
        assert_eq!((source.starts, source.dones), (1, 1));
    }

    #[test]
    fn test_invalid_viewport_skips_engine() {
        let mut source = ScriptedSource { peers: three_peers(), ..Default::default() };
        let mut renderer = RecordingRenderer::new();
        let ctx = RenderContext::new(Rect::new(0.0, 0.0, 0.0, 600.0));

        let err = FrameRenderer::default()
            .render(&mut source, LogicalPoint::ORIGIN, &ctx, &mut renderer)
            .unwrap_err();

        assert!(matches!(err, FrameError::InvalidExtent(_)));
        assert_eq!(source.starts, 0);
        assert_eq!(renderer.frames(), 0);
    }

    #[test]
    fn test_brackets_balance_over_many_frames() {
        let mut source = ScriptedSource { peers: three_peers(), ..Default::default() };
        let mut renderer = RecordingRenderer::new();
        let frames = FrameRenderer::default().with_fuse(2);

        for i in 0..10 {
            source.stuck = i % 2 == 0;
            frames
                .render(&mut source, LogicalPoint::ORIGIN, &ctx(), &mut renderer)
                .unwrap();
        }
        assert_eq!(source.starts, 10);
        assert_eq!(source.dones, 10);
    }

    #[test]
    fn test_scaled_extent() {
        let canvas = CanvasConfig {
            logical_extent: Some(Size::new(600.0, 1200.0)),
            ..CanvasConfig::default()
        };
        let frames = FrameRenderer::from_config(&canvas).unwrap();
        let mut source = ScriptedSource::default();
        let mut renderer = RecordingRenderer::new();

        frames
            .render(&mut source, LogicalPoint::new(-60, -200), &ctx(), &mut renderer)
            .unwrap();
        assert_eq!(renderer.local().map(|b| b.center), Some(Point::new(120.0, 200.0)));
    }
}
