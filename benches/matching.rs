use criterion::{criterion_group, criterion_main, Criterion};

use mailembed::embed::{extract_embedded, generate_cid, materialize_body};
use mailembed::model::attachment::AttachmentMetadata;
use mailembed::model::headers::AttachmentHeaders;

fn sample_body(images: usize) -> String {
    let mut body = String::from("<html><body><p>Report</p>");
    for i in 0..images {
        body.push_str(&format!(
            "<div><p>Figure {i}</p><img src=\"cid:fig{i}@example.com\" alt=\"fig\"></div>"
        ));
    }
    body.push_str("</body></html>");
    body
}

fn sample_attachments(count: usize) -> Vec<AttachmentMetadata> {
    (0..count)
        .map(|i| {
            AttachmentMetadata::new(
                AttachmentHeaders::from_pairs([("content-id", format!("<fig{i}@example.com>"))]),
                "image/png",
            )
        })
        .collect()
}

fn bench_materialize(c: &mut Criterion) {
    let body = sample_body(50);
    c.bench_function("materialize_body_50_images", |b| {
        b.iter(|| materialize_body(Some(&body)))
    });
}

fn bench_extract(c: &mut Criterion) {
    let body = sample_body(50);
    let attachments = sample_attachments(60);
    let fragment = materialize_body(Some(&body));

    c.bench_function("extract_embedded_60_of_50", |b| {
        b.iter(|| extract_embedded(&attachments, &fragment).len())
    });
}

fn bench_generate(c: &mut Criterion) {
    let input = vec![0xA5u8; 64 * 1024];
    c.bench_function("generate_cid_64k", |b| {
        b.iter(|| generate_cid(&input, "me@example.com"))
    });
}

criterion_group!(benches, bench_materialize, bench_extract, bench_generate);
criterion_main!(benches);
