use std::io::Cursor;

use finspace::core::array::{Array, ByteArray, DoubleArray, LongArray, ShortArray};
use finspace::core::compress::Compressor;
use finspace::core::element::{Element, ElementKind};
use finspace::core::shape::Shape;
use finspace::ComputeError;

fn test_shapes() -> Vec<Shape> {
    vec![
        Shape::empty(),
        Shape::of(&[7]).unwrap(),
        Shape::of2(3, 5).unwrap(),
        Shape::of3(3, 5, 7).unwrap(),
    ]
}

/// Encode through `compressor` into memory and decode again.
fn roundtrip<T: Element>(array: &Array<T>, compressor: Compressor) -> Array<T> {
    let mut w = compressor.writer(Vec::new());
    array.write_to(&mut w).unwrap();
    let bytes = w.finish().unwrap();
    let mut r = compressor.reader(Cursor::new(bytes));
    Array::read_from(&mut r).unwrap()
}

#[test]
fn shapes_roundtrip_through_the_binary_header() {
    for shape in test_shapes() {
        let mut buf = Vec::new();
        shape.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), 1 + 8 * shape.rank());
        let back = Shape::read_from(&mut Cursor::new(buf)).unwrap();
        assert_eq!(back, shape);
        assert_eq!(back.total_size(), shape.total_size());
    }
}

#[test]
fn header_bytes_are_big_endian() {
    let array = ShortArray::from_vec(Shape::of(&[2]).unwrap(), vec![1, -2]).unwrap();
    let mut buf = Vec::new();
    array.write_to(&mut buf).unwrap();
    assert_eq!(
        buf,
        vec![1, 0, 0, 0, 0, 0, 0, 0, 2, 0x00, 0x01, 0xFF, 0xFE]
    );

    let mut buf = Vec::new();
    Shape::empty().write_to(&mut buf).unwrap();
    assert_eq!(buf, vec![0]);

    let longs = LongArray::wrap(vec![0x0102_0304_0506_0708]);
    let mut buf = Vec::new();
    longs.write_to(&mut buf).unwrap();
    assert_eq!(&buf[9..], &[1, 2, 3, 4, 5, 6, 7, 8]);
}

#[test]
fn every_kind_roundtrips_with_every_compressor() {
    for shape in test_shapes() {
        let bytes = ByteArray::from_fn(shape, |gid| (gid * 37 % 256) as u8).unwrap();
        let shorts = ShortArray::from_fn(shape, |gid| (gid as i16) * -3).unwrap();
        let longs = LongArray::from_fn(shape, |gid| gid.wrapping_mul(0x9E37_79B9_7F4A_7C15)).unwrap();
        let doubles = DoubleArray::from_fn(shape, |gid| gid as f64 / 7.0 - 2.5).unwrap();

        for c in Compressor::ALL {
            assert_eq!(roundtrip(&bytes, c), bytes, "{c} {shape:?}");
            assert_eq!(roundtrip(&shorts, c), shorts, "{c} {shape:?}");
            assert_eq!(roundtrip(&longs, c), longs, "{c} {shape:?}");
            assert_eq!(roundtrip(&doubles, c), doubles, "{c} {shape:?}");
        }
    }
}

#[test]
fn doubles_compare_bit_exact() {
    let values = vec![f64::NAN, -0.0, f64::INFINITY, f64::MIN_POSITIVE];
    let array = DoubleArray::wrap(values);
    let back = roundtrip(&array, Compressor::None);
    assert_eq!(back, array);
    assert_ne!(DoubleArray::wrap(vec![0.0]), DoubleArray::wrap(vec![-0.0]));
}

#[test]
fn large_byte_array_roundtrips_through_files() {
    let dir = tempfile::tempdir().unwrap();
    let shape = Shape::of2(256, 256).unwrap();
    let array = ByteArray::from_fn(shape, |gid| (gid % 251) as u8).unwrap();

    for c in Compressor::ALL {
        let path = dir.path().join(format!("bytes.{}", c.name()));
        array.save(&path, c).unwrap();
        let back = ByteArray::load(&path, c).unwrap();
        assert_eq!(back, array, "{c}");
    }
}

#[test]
fn truncated_input_is_an_io_error() {
    let array = LongArray::from_fn(Shape::of2(3, 5).unwrap(), |gid| gid).unwrap();
    let mut buf = Vec::new();
    array.write_to(&mut buf).unwrap();

    let short = &buf[..buf.len() - 1];
    let err = LongArray::read_from(&mut Cursor::new(short)).unwrap_err();
    assert!(matches!(err, ComputeError::Io { .. }), "{err}");

    let header_only = &buf[..5];
    assert!(matches!(
        LongArray::read_from(&mut Cursor::new(header_only)),
        Err(ComputeError::Io { .. })
    ));

    assert!(matches!(
        Shape::read_from(&mut Cursor::new(Vec::<u8>::new())),
        Err(ComputeError::Io { .. })
    ));
}

#[test]
fn malformed_header_is_rejected_without_allocating() {
    // Rank 9 is above the supported maximum.
    let mut bad_rank = vec![9u8];
    bad_rank.extend(std::iter::repeat(0u8).take(9 * 8));
    assert!(Shape::read_from(&mut Cursor::new(bad_rank)).is_err());

    // A huge declared shape with no element data fails on the short read.
    let mut huge = vec![1u8];
    huge.extend_from_slice(&(1u64 << 40).to_be_bytes());
    assert!(ByteArray::read_from(&mut Cursor::new(huge)).is_err());
}

#[test]
fn get_and_put_check_bounds() {
    let mut array = ShortArray::allocate(Shape::of2(3, 5).unwrap()).unwrap();
    assert_eq!(array.element_kind(), ElementKind::Short);
    assert_eq!(array.bytes_per_element(), 2);
    assert!(array.iter().all(|v| v == 0));

    array.put(14, 42).unwrap().put(0, -1).unwrap();
    assert_eq!(array.get(14).unwrap(), 42);
    assert_eq!(array.get(0).unwrap(), -1);

    assert!(matches!(
        array.get(15),
        Err(ComputeError::Index { gid: 15, size: 15, .. })
    ));
    assert!(matches!(
        array.put(100, 1),
        Err(ComputeError::Index { .. })
    ));
}

#[test]
fn fill_variants_agree() {
    let shape = Shape::of3(4, 8, 16).unwrap();
    let seq = LongArray::from_fn(shape, |gid| gid * gid).unwrap();

    let mut par = LongArray::allocate(shape).unwrap();
    par.par_fill(|gid| gid * gid);
    assert_eq!(par, seq);

    let mut fallible = LongArray::allocate(shape).unwrap();
    fallible.try_fill(|gid| Ok::<u64, ()>(gid * gid)).unwrap();
    assert_eq!(fallible, seq);

    let err = fallible.try_fill(|gid| if gid == 10 { Err(gid) } else { Ok(0) });
    assert_eq!(err.unwrap_err(), 10);
}

#[test]
fn equality_needs_equal_shapes() {
    let flat = LongArray::wrap((0..15).collect());
    let grid = LongArray::from_vec(Shape::of2(3, 5).unwrap(), (0..15).collect()).unwrap();
    assert_ne!(flat, grid);
    assert_eq!(flat.as_slice(), grid.as_slice());
    assert!(LongArray::from_vec(Shape::of2(3, 5).unwrap(), vec![0; 14]).is_err());
}

#[test]
fn shape_construction_guards_overflow_and_rank() {
    assert!(matches!(
        Shape::of(&[u64::MAX, 2]),
        Err(ComputeError::Overflow { .. })
    ));
    assert!(Shape::of(&[1; 9]).is_err());
    assert_eq!(Shape::of(&[]).unwrap(), Shape::empty());
    assert_eq!(Shape::of3(3, 5, 7).unwrap().to_coords(17).unwrap(), vec![0, 2, 3]);
}

#[test]
fn nested_visitors_follow_global_index_order() {
    let shape = Shape::of2(3, 4).unwrap();
    let mut gids = Vec::new();
    shape
        .for_each_2d(|i, j| gids.push(shape.gid_2d(i, j)))
        .unwrap();
    assert_eq!(gids, shape.iter().collect::<Vec<_>>());

    let line = Shape::linear(3);
    let mut seen = Vec::new();
    line.for_each_3d(|i, j, k| seen.push((i, j, k))).unwrap();
    assert_eq!(seen, vec![(0, 0, 0), (1, 0, 0), (2, 0, 0)]);

    let cube = Shape::of3(2, 2, 2).unwrap();
    assert!(matches!(
        cube.for_each_2d(|_, _| {}),
        Err(ComputeError::Unsupported { .. })
    ));
}

#[test]
fn compressor_names_resolve() {
    for c in Compressor::ALL {
        assert_eq!(Compressor::by_name(c.name()).unwrap(), c);
    }
    assert_eq!(Compressor::by_name("GZ").unwrap(), Compressor::Gzip);
    assert!(matches!(
        Compressor::by_name("lzma"),
        Err(ComputeError::InvalidConfig { .. })
    ));
}

#[test]
fn parallel_index_visitor_covers_every_gid() {
    use std::sync::atomic::{AtomicU64, Ordering};

    let shape = Shape::of3(5, 6, 7).unwrap();
    let sum = AtomicU64::new(0);
    shape.par_for_each(|gid| {
        sum.fetch_add(gid, Ordering::Relaxed);
    });
    assert_eq!(sum.into_inner(), shape.iter().sum::<u64>());

    let kinds = [
        (ElementKind::Byte, 1),
        (ElementKind::Short, 2),
        (ElementKind::Long, 8),
        (ElementKind::Double, 8),
    ];
    for (kind, bytes) in kinds {
        assert_eq!(kind.bytes_per_element(), bytes);
    }
    let doubles = DoubleArray::from_fn(shape, |gid| gid as f64).unwrap();
    assert_eq!(doubles.element_kind().bytes_per_element(), doubles.bytes_per_element());
    assert_eq!(doubles.into_vec().len(), 210);
}
