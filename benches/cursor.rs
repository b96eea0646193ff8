use criterion::{criterion_group, criterion_main, Criterion};
use pprof::criterion::{Output, PProfProfiler};
use quarry_json::cursor::Cursor;
use quarry_json::sax::json_cursor;

fn build_document(records: usize) -> String {
    let mut doc = String::from("[");
    for i in 0..records {
        if i > 0 {
            doc.push(',');
        }
        doc.push_str(&format!(
            r#"{{"id": {}, "name": "record-{}", "score": {}.5, "wide": 18446744073709551616{}, "flags": [true, false, null]}}"#,
            i, i, i, i
        ));
    }
    doc.push(']');
    doc
}

fn pull_all(doc: &str) {
    let mut cursor = json_cursor(doc).unwrap();
    let mut count = 0usize;
    while !cursor.done() {
        count += 1;
        cursor.next().unwrap();
    }
    assert!(count > 0);
}

fn benchmark_cursor_pull(c: &mut Criterion) {
    let doc = build_document(1000);
    c.bench_function("cursor pull over 1000 records", |b| b.iter(|| pull_all(&doc)));
}

fn benchmark_dom_parse(c: &mut Criterion) {
    let doc = build_document(1000);
    let parser = quarry_json::dom::Parser::default();
    c.bench_function("DOM materialization of 1000 records", |b| {
        b.iter(|| parser.parse_str(&doc).unwrap())
    });
}

criterion_group! {
    name = cursor_benches;
    config = Criterion::default().with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)));
    targets = benchmark_cursor_pull, benchmark_dom_parse
}
criterion_main!(cursor_benches);
