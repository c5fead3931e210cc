use bencher::{CHUNK_SIZES, CHUNKED_RESPONSE, Fixture, FixtureKind, requests};
use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use micro_http_parser::codec::{H1Recognizer, Recognizer};
use micro_http_parser::parser::Parser;
use std::cell::Cell;
use std::hint::black_box;
use std::rc::Rc;

fn parser_for(fixture: &Fixture) -> Parser {
    match fixture.kind() {
        FixtureKind::Request => Parser::request(),
        FixtureKind::Response => Parser::response(),
    }
}

fn benchmark_recognizer(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("h1_recognizer");

    for fixture in requests() {
        group.throughput(Throughput::Bytes(fixture.len()));
        group.bench_with_input(BenchmarkId::from_parameter(fixture.name()), &fixture, |b, fixture| {
            let mut recognizer = H1Recognizer::request();
            b.iter_batched_ref(
                Vec::new,
                |tokens| {
                    recognizer.recognize(fixture.bytes(), tokens);
                    black_box(tokens.len());
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn benchmark_parser(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("parser_feed");

    for chunk_size in CHUNK_SIZES {
        for fixture in requests() {
            group.throughput(Throughput::Bytes(fixture.len()));
            group.bench_with_input(BenchmarkId::new(fixture.name(), chunk_size), &fixture, |b, fixture| {
                let fields = Rc::new(Cell::new(0usize));
                let mut parser = parser_for(fixture);
                let counter = Rc::clone(&fields);
                parser.on_header_field(move |_, _| {
                    counter.set(counter.get() + 1);
                    Ok(())
                });

                b.iter(|| {
                    for chunk in fixture.bytes().chunks(chunk_size) {
                        parser.feed(chunk).expect("input should be a valid http request");
                    }
                    black_box(fields.get());
                });
            });
        }
    }

    group.throughput(Throughput::Bytes(CHUNKED_RESPONSE.len()));
    group.bench_function(CHUNKED_RESPONSE.name(), |b| {
        let mut parser = parser_for(&CHUNKED_RESPONSE);
        parser.on_body(|_, data| {
            black_box(data);
            Ok(())
        });
        b.iter(|| parser.feed(CHUNKED_RESPONSE.bytes()).expect("input should be a valid http response"));
    });

    group.finish();
}

criterion_group!(parser, benchmark_recognizer, benchmark_parser);
criterion_main!(parser);
