use catalog_extract::parsing_modules::embedded_data;
use catalog_extract::{extract_page, ExtractOptions, Site};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn embedded_page(products: usize) -> String {
    let items: Vec<String> = (0..products)
        .map(|i| {
            format!(
                r#"{{"id":{i},"title":"Засіб для прання {i}","slug":"zasib-{i}","offer":{{"price":{price},"old_price":{old},"available":true,"stock":5}},"brand":{{"name":"Gala"}}}}"#,
                i = i,
                price = 10_000 + i,
                old = 12_000 + i
            )
        })
        .collect();
    format!(
        r#"<html><body><script>window.__STATE__ = {{"products":[{}]}};</script></body></html>"#,
        items.join(",")
    )
}

fn markup_page(cards: usize) -> String {
    let body: String = (0..cards)
        .map(|i| {
            format!(
                r#"<div data-testid="productItem"><a href="/product/p-{i}"><img data-testid="productImage" src="/i/{i}.jpg"></a><span data-testid="productName" title="Товар {i}">Товар</span><p data-testid="productFullPrice">1 299 ₴</p><p data-testid="finalPrice">999 ₴</p><svg data-testid="reviewStar"></svg></div>"#,
                i = i
            )
        })
        .collect();
    format!("<html><body>{}</body></html>", body)
}

fn bench_embedded_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("embedded_scan");
    for products in [10, 60, 240] {
        let html = embedded_page(products);
        group.throughput(Throughput::Bytes(html.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(products), &html, |b, html| {
            b.iter(|| embedded_data::scan(black_box(html)));
        });
    }
    group.finish();
}

fn bench_extract_page(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_page");
    let profile = Site::Maudau.profile();
    let options = ExtractOptions::default();

    let structured = embedded_page(60);
    group.bench_function("structured", |b| {
        b.iter(|| extract_page(black_box(&structured), profile.as_ref(), &options))
    });

    let markup = markup_page(60);
    group.bench_function("markup", |b| {
        b.iter(|| extract_page(black_box(&markup), profile.as_ref(), &options))
    });

    group.finish();
}

criterion_group!(benches, bench_embedded_scan, bench_extract_page);
criterion_main!(benches);
