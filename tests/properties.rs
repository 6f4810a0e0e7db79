//! Property tests for conversions and restoration.

use glaze_noise::{ColorSpaceConverter, PixelBuffer, StatisticsRestorer};
use proptest::prelude::*;

fn rgb_buffer() -> impl Strategy<Value = PixelBuffer> {
    (1usize..12, 1usize..12).prop_flat_map(|(h, w)| {
        proptest::collection::vec(any::<u8>(), h * w * 3)
            .prop_map(move |data| PixelBuffer::new(data, h, w, 3).unwrap())
    })
}

fn any_buffer() -> impl Strategy<Value = PixelBuffer> {
    (1usize..10, 1usize..10, prop_oneof![Just(1usize), Just(3), Just(4)]).prop_flat_map(|(h, w, c)| {
        proptest::collection::vec(any::<u8>(), h * w * c)
            .prop_map(move |data| PixelBuffer::new(data, h, w, c).unwrap())
    })
}

proptest! {
    #[test]
    fn ycbcr_roundtrip_within_one(buffer in rgb_buffer()) {
        let ycc = ColorSpaceConverter::to_ycbcr(&buffer).unwrap();
        let back = ColorSpaceConverter::to_rgb(&ycc).unwrap();

        prop_assert_eq!(back.shape(), buffer.shape());
        for (a, b) in buffer.as_bytes().iter().zip(back.as_bytes()) {
            prop_assert!(a.abs_diff(*b) <= 1, "{} -> {}", a, b);
        }
    }

    #[test]
    fn restore_of_unchanged_buffer_is_identity(buffer in any_buffer()) {
        let out = StatisticsRestorer::new().restore(&buffer, &buffer).unwrap();
        prop_assert_eq!(out, buffer);
    }
}
