use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tether_core::codec::{checksum, Link};
use tether_core::{RegisterFile, ScriptedTransport, Signal, SparseMemory, Stub};

fn bench_register_dump_framing(c: &mut Criterion) {
    let regs = RegisterFile::new(0x8000, 0x8000);
    c.bench_function("send_register_block", |b| {
        b.iter(|| {
            let mut link = Link::new(ScriptedTransport::default());
            let _ = link.send_block(black_box(&regs.dump_all()));
            black_box(link.into_inner().take_output())
        })
    });
}

fn bench_memory_read_cycle(c: &mut Criterion) {
    let payload = "m8000,100";
    let frame = format!("${payload}#{:02x}$c#63", checksum(payload.as_bytes()));
    let mut image = SparseMemory::new();
    image.load(0x8000, &[0xa5; 0x100]);

    c.bench_function("trap_cycle_read_256_bytes", |b| {
        b.iter(|| {
            let mut stub = Stub::new(
                ScriptedTransport::new(frame.as_bytes()),
                image.clone(),
                RegisterFile::new(0x8000, 0x8000),
            );
            black_box(stub.trap_entry(Signal::Trap))
        })
    });
}

criterion_group!(benches, bench_register_dump_framing, bench_memory_read_cycle);
criterion_main!(benches);
