//! Wrapper micro-benchmarks
//!
//! Measures bare-name resolution, iteration and path queries over classes
//! with a growing number of methods.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use doxweave::wrapper::{SRC_NAMESPACE, XmlWrapper};
use doxweave_dom::Document;
use std::hint::black_box;
use std::sync::Arc;

fn class_with_methods(count: usize) -> XmlWrapper {
    let mut xml = String::from(r#"<class xmlns="http://xml.phpdox.net/src" name="Big" full="App\Big">"#);
    for i in 0..count {
        xml.push_str(&format!(
            r#"<method name="m{i}" visibility="public"><parameter name="a"/><parameter name="b"/></method>"#
        ));
    }
    xml.push_str("</class>");
    let doc = Document::parse(&xml).expect("benchmark XML parses");
    XmlWrapper::from_document(Arc::new(doc), SRC_NAMESPACE)
}

fn benchmark_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolution_get");
    for count in [10, 100, 1000] {
        let class = class_with_methods(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &class, |b, class| {
            b.iter(|| {
                let name = class.get(black_box("name")).map(|n| n.as_text());
                let methods = class.get(black_box("method")).map(|m| m.count());
                (name, methods)
            });
        });
    }
    group.finish();
}

fn benchmark_iterate(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolution_iterate");
    for count in [10, 100, 1000] {
        let methods = class_with_methods(count).get("method").expect("methods exist");
        group.bench_with_input(BenchmarkId::from_parameter(count), &methods, |b, methods| {
            b.iter(|| {
                methods
                    .iter()
                    .filter_map(|m| m.get("name"))
                    .map(|n| n.as_text().len())
                    .sum::<usize>()
            });
        });
    }
    group.finish();
}

fn benchmark_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolution_query");
    for count in [10, 100, 1000] {
        let class = class_with_methods(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &class, |b, class| {
            b.iter(|| {
                class
                    .query(black_box("dox:method/dox:parameter/@name"))
                    .ok()
                    .flatten()
                    .map(|names| names.count())
            });
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_get, benchmark_iterate, benchmark_query);
criterion_main!(benches);
