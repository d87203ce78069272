//! Codec throughput benchmarks.
//!
//! Run with: cargo bench --bench codec_benchmark
//!
//! Measures decode and encode throughput per format over synthetic
//! documents of increasing size, plus the structural validator on its own.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use spdx_doc::codec::{DocumentFormat, decode_str, encode_str};
use spdx_doc::model::{
    Agent, Checksum, ChecksumAlgorithm, CreationInfo, Document, ElementId, File, Package,
    Relationship, RelationshipType, parse_timestamp,
};
use std::hint::black_box;

/// Build a document with `count` packages, one file each, plus the
/// describes and membership relationships a real SBOM would carry.
fn generate_document(count: usize) -> Document {
    let created = parse_timestamp("2024-01-15T10:30:00Z").expect("valid timestamp");
    let creation = CreationInfo::new(created)
        .with_creator(Agent::Tool("spdx-doc-bench".to_string()));
    let mut doc = Document::new("bench", "https://example.com/spdx/bench", creation);

    for i in 0..count {
        let pkg_id = ElementId::new(format!("Package-{i}")).expect("valid id");
        let file_id = ElementId::new(format!("File-{i}")).expect("valid id");

        doc.add_package(
            Package::new(pkg_id.clone(), format!("component-{i}"))
                .with_version(format!("1.{}.{}", i % 10, i % 100))
                .with_download_location(format!("https://example.com/component-{i}.tar.gz"))
                .with_license_concluded("Apache-2.0"),
        );
        doc.add_file(
            File::new(file_id.clone(), format!("./src/component_{i}.rs"))
                .with_checksum(Checksum::new(
                    ChecksumAlgorithm::Sha1,
                    format!("{:040x}", i * 2654435761),
                ))
                .with_license_concluded("Apache-2.0"),
        );
        doc.add_relationship(Relationship::new(
            doc.id.clone(),
            RelationshipType::Describes,
            pkg_id.clone(),
        ));
        doc.add_relationship(Relationship::new(
            pkg_id,
            RelationshipType::Contains,
            file_id,
        ));
    }

    doc
}

const FORMATS: [DocumentFormat; 4] = [
    DocumentFormat::TagValue,
    DocumentFormat::Json,
    DocumentFormat::Yaml,
    DocumentFormat::RdfXml,
];

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    for size in [10, 100, 1000] {
        let doc = generate_document(size);
        for format in FORMATS {
            group.bench_with_input(
                BenchmarkId::new(format.name(), size),
                &doc,
                |b, doc| b.iter(|| encode_str(black_box(doc), format).unwrap()),
            );
        }
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    for size in [10, 100, 1000] {
        let doc = generate_document(size);
        for format in FORMATS {
            let content = encode_str(&doc, format).expect("encodes");
            group.bench_with_input(
                BenchmarkId::new(format.name(), size),
                &content,
                |b, content| b.iter(|| decode_str(black_box(content)).unwrap()),
            );
        }
    }
    group.finish();
}

fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate");
    for size in [100, 1000, 10_000] {
        let doc = generate_document(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &doc, |b, doc| {
            b.iter(|| spdx_doc::validate::validate(black_box(doc)).unwrap());
        });
    }
    group.finish();
}

fn bench_content_digest(c: &mut Criterion) {
    let mut group = c.benchmark_group("content_digest");
    for size in [100, 1000] {
        let doc = generate_document(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &doc, |b, doc| {
            b.iter(|| black_box(doc).content_digest());
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_encode,
    bench_decode,
    bench_validate,
    bench_content_digest
);
criterion_main!(benches);
