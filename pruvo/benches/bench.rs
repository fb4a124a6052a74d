use criterion::{criterion_group, criterion_main, Criterion};
use pruvo::ast::RelOp;
use pruvo::raw::Entry;

#[path = "../tests/common/mod.rs"]
mod common;

use common::*;

/// `fib(n) = n < 2 ? n : fib(n - 1) + fib(n - 2)`
fn fib(n: i64) -> Vec<Entry> {
    let m = || var("n");
    let base = if_else(rel(RelOp::Lt, m(), num(2)), vec![ret(m())], None);
    let fib_m = |k| call("fib", vec![sub(m(), num(k))]);
    let rec = ret(add(fib_m(1), fib_m(2)));
    let fib = func("fib", vec![arg(u64_t(), "n")], u64_t(), vec![base, rec]);
    let main = func("main", vec![], u64_t(), vec![ret(call("fib", vec![num(n)]))]);
    vec![fib, main]
}

/// `f0(x) = x + 1`, `f(i+1)(x) = f(i)(x) + 1`
fn chain(n: usize) -> Vec<Entry> {
    let x = || var("x");
    let succ = |name: String, inner| func(&name, vec![arg(i32_t(), "x")], i32_t(), vec![ret(add(inner, num(1)))]);
    let mut entries = vec![succ("f0".into(), x())];
    for i in 1..n {
        let prev = call(&format!("f{}", i - 1), vec![x()]);
        entries.push(succ(format!("f{}", i), prev));
    }
    let last = call(&format!("f{}", n - 1), vec![num(0)]);
    entries.push(func("main", vec![], i32_t(), vec![ret(last)]));
    entries
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let fib8 = fib(8);
    let chain32 = chain(32);

    c.bench_function("check chain32", |b| b.iter(|| check(chain32.clone()).unwrap()));
    c.bench_function("chain32", |b| b.iter(|| compile(chain32.clone()).unwrap()));
    c.bench_function("fib8", |b| b.iter(|| compile(fib8.clone()).unwrap()));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
