use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sfsave::{SaveContainer, SaveHeader};

fn sample_save() -> SaveContainer {
    let part_size = 0x40000u64;
    let parts: Vec<Vec<u8>> = (0..16u8).map(|i| vec![i; part_size as usize - 7]).collect();
    let header = SaveHeader::new(parts.len() as u64 * part_size, part_size);
    SaveContainer::new(header, parts)
}

fn bench_encode(c: &mut Criterion) {
    let save = sample_save();

    c.bench_function("encode_packed_4mb", |b| b.iter(|| black_box(&save).encode_packed().unwrap()));
    c.bench_function("encode_to_parts_4mb", |b| b.iter(|| black_box(&save).encode_to_parts().unwrap()));
}

fn bench_decode(c: &mut Criterion) {
    let save = sample_save();
    let packed = save.encode_packed().unwrap();
    let split = save.encode_to_parts().unwrap();

    c.bench_function("decode_packed_4mb", |b| {
        b.iter(|| SaveContainer::decode_packed(black_box(&packed)).unwrap())
    });
    c.bench_function("decode_from_parts_4mb", |b| {
        b.iter(|| SaveContainer::decode_from_parts(black_box(&split.header), black_box(&split.parts)).unwrap())
    });
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
