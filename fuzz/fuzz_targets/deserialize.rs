#![no_main]

use libfuzzer_sys::fuzz_target;
use roaring_core::{Bitmap, Error, Portable};

fuzz_target!(|input: &[u8]| {
    let mut bitmap = match Bitmap::try_deserialize::<Portable>(input) {
        Ok(bitmap) => bitmap,
        Err(Error::InvalidFormat(_) | Error::Io(_)) => return,
    };

    // Whatever was accepted must serialize back to an equal bitmap
    let serialized = bitmap.serialize::<Portable>().unwrap();
    assert_eq!(serialized.len(), bitmap.get_serialized_size_in_bytes::<Portable>());
    assert_eq!(Bitmap::try_deserialize::<Portable>(&serialized).unwrap(), bitmap);
    assert_eq!(bitmap.iter().count() as u64, bitmap.cardinality());

    let start_cardinality = bitmap.cardinality();
    let mut new_cardinality = start_cardinality;
    for i in 100..1000 {
        if !bitmap.contains(i) {
            bitmap.add(i);
            new_cardinality += 1;
        }
    }
    assert_eq!(new_cardinality, bitmap.cardinality(), "Cardinality mismatch");
});
