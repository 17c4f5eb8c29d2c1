//! # Dataset Prompts
//!
//! Templates used by the offline dataset tooling: question and answer synthesis,
//! sliding-window question generation, preference sampling and chat-dataset conversion.

/// Asks for five factual questions about a single paragraph.
///
/// Placeholders: `{isi}`
pub const QUESTION_SPECIFIC_PROMPT: &str = r#"Buat 5 pertanyaan faktual berdasarkan isi pasal berikut.
Sangat penting: Jangan sebutkan kata "pasal", "dokumen", "UU", atau kata referensi lain yang mengacu pada teks itu sendiri.
Jangan gunakan frasa seperti "menurut pasal ini", "berdasarkan dokumen", atau sejenisnya.
Pertanyaan harus terdengar natural, seperti orang awam bertanya.
Jangan ulang kata-kata persis dari teks.
Contoh:
   - Bagus: "Siapa yang wajib membayar iuran tersebut?"
   - Buruk: "Siapa yang wajib membayar iuran menurut pasal ini?"

Tuliskan pertanyaan dalam format:
1. ...
2. ...
3. ...
4. ...
5. ...

Isi Pasal:
{isi}

Pertanyaan:"#;

/// Asks for five analytical or case-based questions about a whole article.
///
/// Placeholders: `{isi}`
pub const QUESTION_COMPLEX_PROMPT: &str = r#"Buat 5 pertanyaan kompleks atau analitis berdasarkan isi pasal berikut.
Pertanyaan bisa mengaitkan implikasi hukum atau contoh kasus.
Pertanyaan harus terdengar natural, seperti orang awam bertanya.
Jangan ulang kata yang persis ada di teks, dan jangan menyebutkan nama UU atau pasal secara literal.

Tuliskan pertanyaan dalam format:
1. ...
2. ...
3. ...
4. ...
5. ...

Isi Pasal:
{isi}

Pertanyaan:"#;

/// Placeholders: `{isi}`, `{sumber}`, `{question}`
pub const ANSWER_SPECIFIC_PROMPT: &str = r#"Jawablah pertanyaan berikut berdasarkan isi pasal yang diberikan.

ATURAN:
- Jawaban harus faktual dan to the point
- Sertakan sumber pasal di akhir kalimat dengan cara yang natural, misal: "sesuai dengan Pasal .. UU Nomor .. Tahun ....".
- Gunakan bahasa formal

Isi Pasal:
{isi}

Sumber Pasal:
{sumber}

Pertanyaan: {question}

Jawaban:"#;

/// Placeholders: `{isi}`, `{sumber}`, `{question}`
pub const ANSWER_COMPLEX_PROMPT: &str = r#"Jawablah pertanyaan berikut berdasarkan isi pasal yang diberikan.

ATURAN:
- Jawaban berupa analisis/studi kasus.
- Gunakan bahasa formal dan akademis.

FORMAT JAWABAN AKHIR:

Sources Used:
{sumber}
[Daftar sumber yang digunakan (minimal 2)]

Summary:
[Rangkuman inti analisis]

PILIH SATU BAGIAN SAJA di bawah ini, lalu isi dengan teks yang relevan:

[[ Conclusion ]]
[Tulis kesimpulan, JIKA analisis berfokus pada ringkasan temuan dan implikasi logis dari data yang ada.]

ATAU

[[ Recommendation ]]
[Tulis rekomendasi, JIKA analisis berfokus pada usulan aksi, kebijakan, atau langkah perbaikan di masa depan.]

Isi Pasal:
{isi}

Pertanyaan: {question}

Jawaban:"#;

/// Asks for one specific and one case-study question about three joined chunks.
///
/// Placeholders: `{text}`
pub const WINDOW_QUESTION_PROMPT: &str = r#"Anda adalah generator pertanyaan jawaban sintetis untuk topik hukum pajak Indonesia.

Diberikan gabungan 3 potongan teks, buatlah:
1. Satu pertanyaan **spesifik** yang dapat dijawab langsung dari isi teks (misalnya terkait sanksi, prosedur, batas waktu, tarif, dll).
2. Satu pertanyaan **studi kasus atau analitis**, yang lebih umum (misalnya "apa dampak", "bagaimana jika", atau "apa peran").

Jika teks tidak mengandung informasi yang bisa dijadikan bahan pertanyaan (misalnya definisi umum, pengantar, atau tidak relevan),
jawab hanya dengan:
"Tidak ada pertanyaan yang bisa diajukan."

Teks:
"""{text}"""

Format jawaban:
Spesifik: ...
Studi Kasus: ...
"#;

/// System prompt shared by answer sampling and binary labelling, where the mode is
/// left for the model to infer from the context.
///
/// Placeholders: `{context}`, `{source}`
pub const PREFERENCE_SYSTEM_PROMPT: &str = r#"Jawab pertanyaan berdasarkan konteks berikut:
{context}

Kamu adalah asisten ahli pajak Indonesia.
Jawaban harus faktual, to the point, dan menggunakan bahasa formal.
Jika informasi tidak ada dikonteks atau pertanyaan tidak berkaitan dengan pajak,
jawab: "Maaf, saya tidak memiliki pemahaman tentang hal itu."

Sumber konteks: {source}

Bila jawaban ditemukan dengan jelas di konteks:
- Sertakan sumber pasal di akhir kalimat dengan cara yang natural,
  misalnya: "sesuai dengan Pasal {pasal} UU Nomor {ayat} Tahun {tahun}".
- Sertakan sumber hukum dengan format:
  Source: Pasal {pasal} Ayat {ayat} UU {uu}.

Bila jawaban tidak ditemukan dengan jelas di konteks:
Gunakan FORMAT JAWABAN AKHIR berikut:

Sources Used:
[Daftar sumber UU yang digunakan (minimal 2)]

Summary:
[Rangkuman inti analisis]

PILIH SATU BAGIAN SAJA di bawah ini, lalu isi dengan teks yang relevan:

[[ Conclusion ]]
[Tulis kesimpulan, JIKA analisis berfokus pada ringkasan temuan
dan implikasi logis dari data yang ada.]

ATAU

[[ Recommendation ]]
[Tulis rekomendasi, JIKA analisis berfokus pada usulan aksi,
kebijakan, atau langkah perbaikan di masa depan.]
"#;

/// System prompt written into converted chat-format training records.
///
/// Only `{type}` is substituted; the remaining braces are kept for the trainer.
pub const TRAINING_SYSTEM_PROMPT: &str = r#"Answer the question based only on the following context:
{context}
Kamu adalah asisten ahli pajak Indonesia.
Jawaban harus faktual dan to the point
Gunakan bahasa formal
Jika informasi tidak ada atau pertanyaan tidak ada hubungannya dengan pajak, jawab: 'Maaf, saya tidak memiliki pemahaman tentang hal itu.

Tipe Jawaban: {type}.
bila type = specific:
Sertakan sumber pasal di akhir kalimat dengan cara yang natural, misal: "sesuai dengan Pasal .. UU Nomor .. Tahun ....".
Sertakan sumber hukum dengan format Source: Pasal {pasal} Ayat {ayat} UU {uu}.

tipe = complex
FORMAT JAWABAN AKHIR:

Sources Used:
{sumber}
[Daftar sumber UU yang digunakan (minimal 2)]

Summary:
[Rangkuman inti analisis]

PILIH SATU BAGIAN SAJA di bawah ini, lalu isi dengan teks yang relevan:

[[ Conclusion ]]
[Tulis kesimpulan, JIKA analisis berfokus pada ringkasan temuan dan implikasi logis dari data yang ada.]

ATAU

[[ Recommendation ]]
[Tulis rekomendasi, JIKA analisis berfokus pada usulan aksi, kebijakan, atau langkah perbaikan di masa depan.]
"#;
