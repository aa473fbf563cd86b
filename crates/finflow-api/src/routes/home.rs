//! Marketing landing page

use axum::{http::HeaderMap, response::Html};

const FEATURES: [(&str, &str, &str); 3] = [
    (
        "📊",
        "Automated Bookkeeping",
        "Upload bank statements and let FinFlow do the hard work for you.",
    ),
    (
        "💡",
        "Tax Compliance",
        "Generate SARS-compliant reports effortlessly with accurate records.",
    ),
    (
        "📈",
        "Real-Time Insights",
        "Track your business health with dashboards, analytics and charts.",
    ),
];

/// Landing page: hero, feature cards, call to action
pub async fn page_home(headers: HeaderMap) -> Html<String> {
    let features: String = FEATURES
        .iter()
        .map(|(icon, title, text)| {
            format!(
                r#"<div class='bg-white rounded-xl shadow-sm p-6 hover:shadow-md transition'>
                <h3 class='text-xl font-bold mb-2'>{} {}</h3>
                <p class='text-gray-600'>{}</p>
            </div>"#,
                icon, title, text
            )
        })
        .collect();

    let inner_content = format!(
        r#"<section class='rounded-2xl px-12 py-20 bg-gradient-to-r from-emerald-600 to-teal-500 text-white mb-12'>
            <div class='max-w-xl'>
                <h2 class='text-5xl font-bold mb-6'>Smart Accounting, Simplified</h2>
                <p class='text-lg mb-6'>FinFlow helps South African businesses stay compliant with SARS by automatically analyzing bank statements and preparing tax-ready reports.</p>
                <a href='/signup' class='inline-block px-6 py-3 bg-white text-emerald-700 font-semibold rounded-lg text-lg'>Try FinFlow Free &rarr;</a>
            </div>
        </section>
        <section id='features' class='grid md:grid-cols-3 gap-8 mb-12'>{}</section>
        <section class='rounded-2xl px-12 py-16 text-center bg-slate-800 text-white'>
            <h2 class='text-3xl font-bold mb-4'>Start your free trial today</h2>
            <p class='mb-6'>Join thousands of businesses streamlining finances with FinFlow</p>
            <a href='/signup' class='inline-block px-6 py-3 bg-emerald-500 text-white font-semibold rounded-lg text-lg'>Get Started Now &rarr;</a>
        </section>"#,
        features
    );

    Html(crate::page_response(&headers, "Smart Accounting", &crate::public_nav(), &inner_content))
}
