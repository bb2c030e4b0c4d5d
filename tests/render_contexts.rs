//! Render context tests: the same drawing through the raster and vector
//! backends.

use pretty_assertions::assert_eq;
use scoretext::{
    CanvasContext, CanvasElement, DrawCommand, FontDescriptor, FontSize, FontStyle, FontWeight,
    GroupAttributes, LineCap, RecordingCanvas, RenderContext, SvgContext,
};

/// Draw a small scene through any backend.
fn draw_scene<C: RenderContext>(ctx: &mut C) {
    let mut attrs = GroupAttributes { pointer_bbox: true, ..Default::default() };
    attrs.attrs.insert("data-measure".to_string(), "3".to_string());
    ctx.open_group("annotation", Some("a1"), Some(&attrs));
    {
        let mut ctx = ctx.saved();
        ctx.set_stroke_style("#222")
            .set_line_width(1.5)
            .set_line_cap(LineCap::Square)
            .begin_path()
            .move_to(0.0, 0.0)
            .line_to(20.0, 0.0)
            .quadratic_curve_to(25.0, 5.0, 20.0, 10.0)
            .bezier_curve_to(15.0, 15.0, 5.0, 15.0, 0.0, 10.0)
            .close_path()
            .stroke();
        ctx.set_font(&FontDescriptor::new("Arial", FontSize::px(14.0), FontWeight::Bold, FontStyle::Normal))
            .fill_text("mf", 30.0, 10.0);
    }
    ctx.close_group();
}

#[test]
fn raster_backend_records_scene() {
    let mut ctx = CanvasContext::new(RecordingCanvas::new(100, 50));
    draw_scene(&mut ctx);

    let cmds = ctx.surface().commands();
    assert_eq!(cmds.first(), Some(&DrawCommand::Save));
    assert_eq!(cmds.last(), Some(&DrawCommand::Restore));
    assert!(cmds.contains(&DrawCommand::Stroke { style: "#222".into(), line_width: 1.5 }));
    assert!(cmds.contains(&DrawCommand::FillText {
        text: "mf".into(),
        x: 30.0,
        y: 10.0,
        font: "normal bold 14px Arial".into(),
        style: "#000000".into(),
    }));
    // Restored after the scene.
    assert_eq!(ctx.stroke_style(), "#000000");
    assert_eq!(ctx.font(), "10px sans-serif");
    assert_eq!(ctx.measure_text("mf").height, 14.0);

    let json = ctx.surface().to_json().expect("Failed to serialize commands");
    assert!(json.contains(r#""op": "quadraticCurveTo""#));
}

#[test]
fn vector_backend_builds_scene_tree() {
    let mut ctx = SvgContext::new(100.0, 50.0);
    draw_scene(&mut ctx);

    let svg = ctx.to_svg();
    let doc = roxmltree::Document::parse(&svg).expect("SVG should parse");
    let root = doc.root_element();
    assert_eq!(root.tag_name().name(), "svg");
    assert_eq!(root.attribute("viewBox"), Some("0 0 100 50"));

    let group = root.first_element_child().expect("scene group");
    assert_eq!(group.tag_name().name(), "g");
    assert_eq!(group.attribute("class"), Some("vf-annotation"));
    assert_eq!(group.attribute("id"), Some("vf-a1"));
    assert_eq!(group.attribute("pointer-events"), Some("bounding-box"));
    assert_eq!(group.attribute("data-measure"), Some("3"));

    let children: Vec<_> = group.children().filter(|n| n.is_element()).collect();
    assert_eq!(children.len(), 2);
    let path = children[0];
    assert_eq!(path.attribute("d"), Some("M0 0L20 0Q25 5 20 10C15 15 5 15 0 10Z"));
    assert_eq!(path.attribute("stroke"), Some("#222"));
    assert_eq!(path.attribute("stroke-width"), Some("1.5"));
    assert_eq!(path.attribute("stroke-linecap"), Some("square"));

    let text = children[1];
    assert_eq!(text.text(), Some("mf"));
    assert_eq!(text.attribute("font-weight"), Some("bold"));
    assert_eq!(text.attribute("font-size"), Some("14px"));
}

#[test]
fn resize_clamps_to_surface_limit() {
    let mut ctx = CanvasContext::with_pixel_ratio(RecordingCanvas::new(10, 10), 3.0);
    ctx.resize(12_000.0, 100.0);
    assert_eq!(
        ctx.canvas(),
        &CanvasElement {
            width: 32767,
            height: 300,
            style_width: "10922px".into(),
            style_height: "100px".into(),
        }
    );
    assert_eq!(
        ctx.surface().commands().last(),
        Some(&DrawCommand::Scale { x: 3.0, y: 3.0 })
    );
}

#[test]
fn headless_surface_measures_and_clears() {
    let mut ctx = CanvasContext::new(RecordingCanvas::detached());
    ctx.set_raw_font("italic 12pt Times New Roman");
    let m = ctx.measure_text("Andante");
    assert!(m.width > 0.0);
    assert_eq!(m.height, 16.0);

    ctx.clear();
    assert_eq!(
        ctx.surface().commands().last(),
        Some(&DrawCommand::ClearRect { x: 0.0, y: 0.0, width: 600.0, height: 400.0 })
    );
}

#[test]
fn shadow_blur_follows_transform_scale() {
    let mut canvas = CanvasContext::new(RecordingCanvas::new(10, 10));
    canvas.scale(1.5, 1.5).set_shadow_color("#888").set_shadow_blur(4.0);
    assert_eq!(canvas.surface().shadow_blur(), 6.0);

    // The vector backend keeps the nominal radius; the transform carries the scale.
    let mut svg = SvgContext::new(10.0, 10.0);
    svg.scale(1.5, 1.5).set_shadow_blur(4.0).fill_rect(0.0, 0.0, 1.0, 1.0);
    let rect = &svg.root().children[0];
    assert_eq!(rect.get_attr("transform"), Some("matrix(1.5 0 0 1.5 0 0)"));
    assert!(rect.get_attr("style").unwrap_or_default().contains("4px"));
}

#[test]
fn arcs_match_between_backends() {
    let mut canvas = CanvasContext::new(RecordingCanvas::new(50, 50));
    canvas.begin_path().arc(25.0, 25.0, 10.0, 0.0, std::f64::consts::TAU, false).fill();
    assert!(canvas.surface().commands().contains(&DrawCommand::Arc {
        x: 25.0,
        y: 25.0,
        radius: 10.0,
        start_angle: 0.0,
        end_angle: std::f64::consts::TAU,
        counterclockwise: false,
    }));

    let mut svg = SvgContext::new(50.0, 50.0);
    svg.begin_path().arc(25.0, 25.0, 10.0, 0.0, std::f64::consts::TAU, false).fill();
    let d = svg.root().children[0].get_attr("d").unwrap_or_default().to_string();
    assert!(d.starts_with("M35 25C"), "{d}");
    assert!(d.ends_with("35 25"), "{d}");
}

#[test]
fn unparsable_raw_font_degrades_the_same_on_both_backends() {
    let font = FontDescriptor::new("Arial", FontSize::px(40.0), FontWeight::Normal, FontStyle::Normal);

    let mut canvas = CanvasContext::new(RecordingCanvas::new(100, 50));
    canvas.set_font(&font).set_raw_font("garbage");
    let mut svg = SvgContext::new(100.0, 50.0);
    svg.set_font(&font).set_raw_font("garbage");

    let from_canvas = canvas.measure_text("Allegro");
    let from_svg = svg.measure_text("Allegro");
    assert_eq!(from_canvas, from_svg);
    assert_eq!(from_canvas.height, 40.0);
    assert_eq!(canvas.font(), "normal normal 40px Arial");
}
