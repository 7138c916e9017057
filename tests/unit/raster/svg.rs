use super::*;

const RED: &[u8] = br##"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="2"><rect width="4" height="2" fill="#ff0000"/></svg>"##;

#[test]
fn rasterizes_at_intrinsic_size() {
    let frame = rasterize_svg(RED, 1.0).unwrap();
    assert_eq!((frame.width, frame.height), (4, 2));
    assert_eq!(frame.data.len(), 4 * 2 * 4);
    assert_eq!(&frame.data[..4], &[255, 0, 0, 255]);
}

#[test]
fn scale_multiplies_the_raster_size() {
    let frame = rasterize_svg(RED, 2.5).unwrap();
    assert_eq!((frame.width, frame.height), (10, 5));
}

#[test]
fn png_output_decodes_back() {
    let png = svg_to_png(RED, 1.0).unwrap();
    let img = image::load_from_memory(&png).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (4, 2));
    assert_eq!(img.get_pixel(3, 1).0, [255, 0, 0, 255]);
}

#[test]
fn translucent_pixels_are_unpremultiplied() {
    let mut px = vec![64, 0, 0, 128, 0, 0, 0, 0, 10, 20, 30, 255];
    unpremultiply_rgba8_in_place(&mut px);
    assert_eq!(px, vec![128, 0, 0, 128, 0, 0, 0, 0, 10, 20, 30, 255]);
}

#[test]
fn rejects_bad_input() {
    assert!(rasterize_svg(b"not svg", 1.0).is_err());
    assert!(rasterize_svg(RED, 0.0).is_err());
    assert!(rasterize_svg(RED, f32::NAN).is_err());
}
