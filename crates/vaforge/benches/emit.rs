use criterion::{Criterion, criterion_group, criterion_main};
use vaforge::{DigOutBus, Direction, Module, ModuleOptions, Statement, Vdc};

const WORDS: u32 = 256;

fn build() -> Module {
    let mut m = Module::with_options("bench", ModuleOptions::reproducible("bench")).unwrap();
    let vdd = m.net("vdd", Direction::Input).unwrap();
    let bias = m.net("bias", Direction::Output).unwrap();
    let bus = m.bus("d", 16, Direction::Output).unwrap();
    let vdc = Vdc::new(&mut m, &bias).unwrap();
    let out = DigOutBus::new(&mut m, &bus, &vdd).unwrap();

    let mut script = Vec::new();
    for word in 0..WORDS {
        script.push(vdc.apply_v(f64::from(word) * 1e-3));
        script.push(out.write(word).unwrap());
        script.push(Statement::wait_us(1.0));
    }
    m.seq(true, script).unwrap();
    m
}

fn benchmark_emit(c: &mut Criterion) {
    c.bench_function("build_sequence_256_states", |b| {
        b.iter(|| {
            let _module = build();
        })
    });

    let module = build();
    c.bench_function("emit_sequence_256_states", |b| {
        b.iter(|| {
            let _text = module.emit().unwrap();
        })
    });
}

criterion_group!(benches, benchmark_emit);
criterion_main!(benches);
