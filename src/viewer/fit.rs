//! Fit modes and pan for the photo view.
//!
//! The image is laid out as a virtual box 1200 units wide with the image's
//! aspect ratio, then scaled into the stage's safe area. Four fit modes
//! cycle on click:
//!
//! | Mode | Scale |
//! |---|---|
//! | contain | `min(safe_w / box_w, safe_h / box_h)` |
//! | fit height | `safe_h / box_h` |
//! | fit width | `safe_w / box_w` |
//! | 1:1 | `natural_w / box_w` (1 until the full image decoded) |
//!
//! One of fit width / fit height always duplicates contain; that mode is
//! skipped when cycling. Pan offsets are kept in stage pixels without the
//! vertical centre offset, which is added only when the transform is built.

/// Width of the virtual layout box.
pub const VIRTUAL_BOX_WIDTH: f64 = 1200.0;
/// Box height before any image decoded.
pub const DEFAULT_BOX_HEIGHT: f64 = 900.0;
/// Horizontal (and top) margin of the safe area.
pub const SIDE_MARGIN: f64 = 18.0;
/// Gap kept between the image and the dock in contain mode.
pub const DOCK_GUTTER: f64 = 18.0;

const REDUNDANT_EPSILON: f64 = 1e-4;
const SCALE_EPSILON: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FitMode {
    Contain,
    FitHeight,
    FitWidth,
    OneToOne,
}

impl FitMode {
    pub const ORDER: [FitMode; 4] = [
        FitMode::Contain,
        FitMode::FitHeight,
        FitMode::FitWidth,
        FitMode::OneToOne,
    ];

    pub fn next(self) -> FitMode {
        match self {
            FitMode::Contain => FitMode::FitHeight,
            FitMode::FitHeight => FitMode::FitWidth,
            FitMode::FitWidth => FitMode::OneToOne,
            FitMode::OneToOne => FitMode::Contain,
        }
    }

    /// Button label.
    pub fn label(self) -> &'static str {
        match self {
            FitMode::Contain => "Fit",
            FitMode::FitHeight => "Fit height",
            FitMode::FitWidth => "Fit width",
            FitMode::OneToOne => "1:1",
        }
    }
}

/// Stage size and the top edge of the metadata dock, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageGeometry {
    pub width: f64,
    pub height: f64,
    pub dock_top: f64,
}

impl StageGeometry {
    pub fn new(width: f64, height: f64, dock_top: f64) -> Self {
        Self {
            width,
            height,
            dock_top,
        }
    }
}

/// Region the image may occupy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SafeArea {
    pub width: f64,
    pub height: f64,
    /// Vertical offset of the safe area's centre from the stage centre.
    pub center_offset_y: f64,
}

impl SafeArea {
    pub fn aspect(&self) -> f64 {
        self.width / self.height
    }
}

pub fn safe_area(stage: StageGeometry, mode: FitMode) -> SafeArea {
    let width = (stage.width - 2.0 * SIDE_MARGIN).max(1.0);
    if mode != FitMode::Contain {
        return SafeArea {
            width,
            height: (stage.height - 2.0 * SIDE_MARGIN).max(1.0),
            center_offset_y: 0.0,
        };
    }

    let top = SIDE_MARGIN;
    // min before max: a stage shorter than two margins still yields bottom = top.
    let bottom = (stage.dock_top - DOCK_GUTTER).min(stage.height - SIDE_MARGIN).max(SIDE_MARGIN);
    SafeArea {
        width,
        height: (bottom - top).max(1.0),
        center_offset_y: (top + bottom) / 2.0 - stage.height / 2.0,
    }
}

/// Box height for an image aspect ratio (width / height).
pub fn box_height_for_aspect(aspect: f64) -> f64 {
    let aspect = if aspect.is_finite() && aspect > 0.0 { aspect } else { 1.0 };
    (VIRTUAL_BOX_WIDTH / aspect).round().max(1.0)
}

/// What the shell applies to the image element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translate_x: f64,
    /// Includes the safe area's centre offset.
    pub translate_y: f64,
    pub scale: f64,
}

impl Transform {
    pub fn css(&self) -> String {
        format!(
            "translate3d({:.2}px, {:.2}px, 0) scale({:.5})",
            self.translate_x, self.translate_y, self.scale
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DragStart {
    pointer_x: f64,
    pointer_y: f64,
    translate_x: f64,
    translate_y: f64,
}

/// Fit-mode and pan state of one open photo.
#[derive(Debug, Clone, PartialEq)]
pub struct FitEngine {
    stage: StageGeometry,
    mode: FitMode,
    scale: f64,
    translate_x: f64,
    translate_y: f64,
    box_width: f64,
    box_height: f64,
    box_ready: bool,
    natural_width: Option<f64>,
    redundant: FitMode,
    drag: Option<DragStart>,
}

impl FitEngine {
    pub fn new(stage: StageGeometry) -> Self {
        let mut engine = Self {
            stage,
            mode: FitMode::Contain,
            scale: 1.0,
            translate_x: 0.0,
            translate_y: 0.0,
            box_width: VIRTUAL_BOX_WIDTH,
            box_height: DEFAULT_BOX_HEIGHT,
            box_ready: false,
            natural_width: None,
            redundant: FitMode::FitWidth,
            drag: None,
        };
        engine.scale = engine.scale_for(FitMode::Contain);
        engine
    }

    pub fn mode(&self) -> FitMode {
        self.mode
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Pan offset without the centre offset.
    pub fn translate(&self) -> (f64, f64) {
        (self.translate_x, self.translate_y)
    }

    pub fn box_size(&self) -> (f64, f64) {
        (self.box_width, self.box_height)
    }

    pub fn is_box_ready(&self) -> bool {
        self.box_ready
    }

    /// The mode that duplicates contain for the current layout.
    pub fn redundant_mode(&self) -> FitMode {
        self.redundant
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Size the box from an image aspect ratio (width / height).
    pub fn set_box_from_aspect(&mut self, aspect: f64) {
        self.box_width = VIRTUAL_BOX_WIDTH;
        self.box_height = box_height_for_aspect(aspect);
        self.box_ready = true;
    }

    /// The low-resolution image decoded. The first decode fixes the box.
    pub fn on_low_decoded(&mut self, width: u32, height: u32) -> Transform {
        if !self.box_ready {
            self.set_box_from_aspect(width as f64 / height.max(1) as f64);
            self.relayout(self.stage, true);
        }
        self.transform()
    }

    /// The full-resolution image decoded; 1:1 now knows its scale.
    pub fn on_high_decoded(&mut self, width: u32, height: u32) -> Transform {
        self.natural_width = Some(width as f64);
        if !self.box_ready {
            self.set_box_from_aspect(width as f64 / height.max(1) as f64);
            self.relayout(self.stage, true);
        } else if self.mode == FitMode::OneToOne {
            self.relayout(self.stage, false);
        }
        self.transform()
    }

    pub fn scale_for(&self, mode: FitMode) -> f64 {
        let safe = safe_area(self.stage, mode);
        match mode {
            FitMode::Contain => (safe.width / self.box_width).min(safe.height / self.box_height),
            FitMode::FitHeight => safe.height / self.box_height,
            FitMode::FitWidth => safe.width / self.box_width,
            FitMode::OneToOne => match self.natural_width {
                Some(w) if w > 0.0 => w / self.box_width,
                _ => 1.0,
            },
        }
    }

    fn update_redundant(&mut self) {
        if !self.box_ready {
            return;
        }
        let safe_aspect = safe_area(self.stage, FitMode::Contain).aspect();
        let image_aspect = self.box_width / self.box_height;
        self.redundant = if image_aspect < safe_aspect - REDUNDANT_EPSILON {
            FitMode::FitHeight
        } else {
            FitMode::FitWidth
        };
    }

    /// Lay out again for a (possibly new) stage. `reset` recentres the pan.
    pub fn relayout(&mut self, stage: StageGeometry, reset: bool) -> Transform {
        self.stage = stage;
        self.update_redundant();
        self.scale = self.scale_for(self.mode);
        if reset {
            self.translate_x = 0.0;
            self.translate_y = 0.0;
        }
        self.clamp_pan();
        self.transform()
    }

    /// Advance to the next useful fit mode, keeping the focal point.
    ///
    /// Returns `None` (and changes nothing) until the box is known.
    pub fn cycle(&mut self) -> Option<FitMode> {
        if !self.box_ready {
            return None;
        }
        self.update_redundant();
        let current = self.scale_for(self.mode);

        let mut candidate = self.mode;
        for _ in 0..FitMode::ORDER.len() {
            candidate = candidate.next();
            if candidate == self.redundant {
                continue;
            }
            if (self.scale_for(candidate) - current).abs() > SCALE_EPSILON {
                break;
            }
        }

        let focal_x = self.translate_x / self.scale;
        let focal_y = self.translate_y / self.scale;
        self.mode = candidate;
        self.scale = self.scale_for(candidate);
        self.translate_x = focal_x * self.scale;
        self.translate_y = focal_y * self.scale;
        self.drag = None;
        self.clamp_pan();
        Some(candidate)
    }

    /// Pointer down. Dragging is off in contain.
    pub fn begin_drag(&mut self, x: f64, y: f64) -> bool {
        if self.mode == FitMode::Contain {
            return false;
        }
        self.drag = Some(DragStart {
            pointer_x: x,
            pointer_y: y,
            translate_x: self.translate_x,
            translate_y: self.translate_y,
        });
        true
    }

    pub fn drag_to(&mut self, x: f64, y: f64) -> Option<Transform> {
        let start = self.drag?;
        self.translate_x = start.translate_x + (x - start.pointer_x);
        self.translate_y = start.translate_y + (y - start.pointer_y);
        self.clamp_pan();
        Some(self.transform())
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    /// Keep the image covering the safe area on axes where it overflows,
    /// centred on axes where it fits.
    pub fn clamp_pan(&mut self) {
        let safe = safe_area(self.stage, self.mode);
        self.translate_x = clamp_axis(self.translate_x, self.box_width * self.scale, safe.width);
        self.translate_y = clamp_axis(self.translate_y, self.box_height * self.scale, safe.height);
    }

    pub fn transform(&self) -> Transform {
        let safe = safe_area(self.stage, self.mode);
        Transform {
            translate_x: self.translate_x,
            translate_y: self.translate_y + safe.center_offset_y,
            scale: self.scale,
        }
    }
}

fn clamp_axis(translate: f64, displayed: f64, safe: f64) -> f64 {
    if displayed <= safe {
        return 0.0;
    }
    let limit = (displayed - safe) / 2.0;
    translate.clamp(-limit, limit)
}
