//! Streaming mzML parser built on quick-xml.
//!
//! A pull-based parser that walks the `<spectrumList>` of a converted mzML
//! file and yields one [`MzMLSpectrum`] at a time, decoding the Base64 peak
//! arrays as it goes. File-level metadata before the spectrum list is
//! skimmed, not modeled in full: the UVPD pipeline only needs the scans.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::binary::{decode_peak_array, PeakCompression, PeakEncoding};
use super::cv::{accessions, normalize_retention_time, CvParam};
use super::models::{MzMLFileMetadata, MzMLSpectrum};
use super::MzMLError;

/// Streaming reader over the spectra of one mzML file.
pub struct MzMLStreamer<R: BufRead> {
    reader: Reader<R>,
    metadata: MzMLFileMetadata,
    in_spectrum_list: bool,
    spectrum_count: Option<usize>,
    current_index: i64,
}

impl MzMLStreamer<BufReader<File>> {
    /// Open an mzML file for streaming.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, MzMLError> {
        let file = File::open(path.as_ref())?;
        Self::new(BufReader::with_capacity(64 * 1024, file))
    }
}

impl<R: BufRead> MzMLStreamer<R> {
    /// Create a streamer from any buffered reader.
    pub fn new(reader: R) -> Result<Self, MzMLError> {
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.config_mut().trim_text(true);

        Ok(Self {
            reader: xml_reader,
            metadata: MzMLFileMetadata::default(),
            in_spectrum_list: false,
            spectrum_count: None,
            current_index: 0,
        })
    }

    /// File-level metadata skimmed on the way to the spectrum list.
    pub fn metadata(&self) -> &MzMLFileMetadata {
        &self.metadata
    }

    /// Declared spectrum count, if the file carries one.
    pub fn spectrum_count(&self) -> Option<usize> {
        self.spectrum_count
    }

    /// Advance to the `<spectrumList>` element, recording run metadata.
    fn seek_spectrum_list(&mut self) -> Result<(), MzMLError> {
        let mut buf = Vec::new();
        loop {
            match self.reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => match e.name().as_ref() {
                    b"mzML" => {
                        self.metadata.version = get_attribute(e, "version")?;
                    }
                    b"run" => {
                        self.metadata.run_id = get_attribute(e, "id")?;
                        self.metadata.run_start_time = get_attribute(e, "startTimeStamp")?;
                    }
                    b"spectrumList" => {
                        self.in_spectrum_list = true;
                        self.spectrum_count =
                            get_attribute(e, "count")?.and_then(|s| s.parse().ok());
                        break;
                    }
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(MzMLError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }
        Ok(())
    }

    /// Read the next spectrum, or `None` once the spectrum list ends.
    pub fn next_spectrum(&mut self) -> Result<Option<MzMLSpectrum>, MzMLError> {
        if !self.in_spectrum_list {
            self.seek_spectrum_list()?;
            if !self.in_spectrum_list {
                return Ok(None);
            }
        }

        let mut buf = Vec::new();
        loop {
            match self.reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    if e.name().as_ref() == b"spectrum" {
                        let spectrum = self.parse_spectrum(&e)?;
                        self.current_index += 1;
                        return Ok(Some(spectrum));
                    }
                }
                Ok(Event::End(ref e)) => {
                    if e.name().as_ref() == b"spectrumList" {
                        self.in_spectrum_list = false;
                        return Ok(None);
                    }
                }
                Ok(Event::Eof) => return Ok(None),
                Err(e) => return Err(MzMLError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }
    }

    /// Consume the streamer as an iterator over spectra.
    pub fn spectra(self) -> SpectrumIterator<R> {
        SpectrumIterator { streamer: self }
    }

    fn parse_spectrum(&mut self, start_event: &BytesStart) -> Result<MzMLSpectrum, MzMLError> {
        let mut spectrum = MzMLSpectrum {
            index: get_attribute(start_event, "index")?
                .and_then(|s| s.parse().ok())
                .unwrap_or(self.current_index),
            id: get_attribute(start_event, "id")?.unwrap_or_default(),
            default_array_length: get_attribute(start_event, "defaultArrayLength")?
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
            ms_level: 1,
            ..Default::default()
        };

        let mut depth = 1;
        let mut in_scan_list = false;
        let mut in_precursor_list = false;
        let mut current_array: Option<BinaryArrayContext> = None;
        let mut buf = Vec::new();

        loop {
            match self.reader.read_event_into(&mut buf) {
                // cvParam arrives as Empty when self-closed and as Start
                // when written with an explicit end tag; both are valid.
                Ok(Event::Start(ref e)) => {
                    depth += 1;
                    match e.name().as_ref() {
                        b"scanList" => in_scan_list = true,
                        b"precursorList" => in_precursor_list = true,
                        b"binaryDataArray" => {
                            current_array = Some(BinaryArrayContext::default());
                        }
                        b"cvParam" => {
                            let cv = CvParam::from_event(e)?;
                            route_cv_param(
                                &mut spectrum,
                                &mut current_array,
                                in_scan_list,
                                in_precursor_list,
                                cv,
                            );
                        }
                        _ => {}
                    }
                }
                Ok(Event::Empty(ref e)) => {
                    if e.name().as_ref() == b"cvParam" {
                        let cv = CvParam::from_event(e)?;
                        route_cv_param(
                            &mut spectrum,
                            &mut current_array,
                            in_scan_list,
                            in_precursor_list,
                            cv,
                        );
                    }
                }
                Ok(Event::Text(ref t)) => {
                    if let Some(ref mut ctx) = current_array {
                        ctx.base64_data = t.unescape()?.into_owned();
                    }
                }
                Ok(Event::End(ref e)) => {
                    depth -= 1;
                    match e.name().as_ref() {
                        b"spectrum" if depth == 0 => break,
                        b"scanList" => in_scan_list = false,
                        b"precursorList" => in_precursor_list = false,
                        b"binaryDataArray" => {
                            if let Some(ctx) = current_array.take() {
                                decode_binary_array(&mut spectrum, ctx)?;
                            }
                        }
                        _ => {}
                    }
                }
                Ok(Event::Eof) => {
                    return Err(MzMLError::InvalidStructure(
                        "unexpected EOF inside <spectrum>".to_string(),
                    ));
                }
                Err(e) => return Err(MzMLError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        if spectrum.mz_array.len() != spectrum.intensity_array.len() {
            return Err(MzMLError::InvalidStructure(format!(
                "spectrum '{}' has {} m/z values but {} intensities",
                spectrum.id,
                spectrum.mz_array.len(),
                spectrum.intensity_array.len()
            )));
        }

        Ok(spectrum)
    }
}

fn route_cv_param(
    spectrum: &mut MzMLSpectrum,
    current_array: &mut Option<BinaryArrayContext>,
    in_scan_list: bool,
    in_precursor_list: bool,
    cv: CvParam,
) {
    if let Some(ctx) = current_array {
        ctx.cv_params.push(cv);
    } else if in_precursor_list {
        // Precursor annotations are irrelevant to range integration;
        // skip them.
    } else if in_scan_list {
        apply_scan_cv_param(spectrum, &cv);
    } else {
        apply_spectrum_cv_param(spectrum, &cv);
    }
}

fn apply_spectrum_cv_param(spectrum: &mut MzMLSpectrum, cv: &CvParam) {
    match cv.accession.as_str() {
        accessions::MS_LEVEL => {
            spectrum.ms_level = cv.value_as_i64().unwrap_or(1) as i16;
        }
        accessions::CENTROID_SPECTRUM => spectrum.centroided = true,
        accessions::PROFILE_SPECTRUM => spectrum.centroided = false,
        accessions::POSITIVE_SCAN => spectrum.polarity = 1,
        accessions::NEGATIVE_SCAN => spectrum.polarity = -1,
        accessions::TOTAL_ION_CURRENT => spectrum.total_ion_current = cv.value_as_f64(),
        accessions::LOWEST_OBSERVED_MZ => spectrum.lowest_mz = cv.value_as_f64(),
        accessions::HIGHEST_OBSERVED_MZ => spectrum.highest_mz = cv.value_as_f64(),
        _ => {}
    }
}

fn apply_scan_cv_param(spectrum: &mut MzMLSpectrum, cv: &CvParam) {
    match cv.accession.as_str() {
        accessions::SCAN_START_TIME => {
            if let Some(val) = cv.value_as_f64() {
                spectrum.retention_time =
                    Some(normalize_retention_time(val, cv.unit_accession.as_deref()));
            }
        }
        _ => apply_spectrum_cv_param(spectrum, cv),
    }
}

fn decode_binary_array(
    spectrum: &mut MzMLSpectrum,
    ctx: BinaryArrayContext,
) -> Result<(), MzMLError> {
    let mut encoding = PeakEncoding::default();
    let mut compression = PeakCompression::default();
    let mut is_mz = false;
    let mut is_intensity = false;

    for cv in &ctx.cv_params {
        let accession = cv.accession.as_str();
        if let Some(enc) = PeakEncoding::from_accession(accession) {
            encoding = enc;
        } else if let Some(comp) = PeakCompression::from_accession(accession) {
            compression = comp;
        } else if accession == accessions::MZ_ARRAY {
            is_mz = true;
        } else if accession == accessions::INTENSITY_ARRAY {
            is_intensity = true;
        }
    }

    if ctx.base64_data.is_empty() {
        return Ok(());
    }

    let values = decode_peak_array(
        &ctx.base64_data,
        encoding,
        compression,
        Some(spectrum.default_array_length),
    )?;

    if is_mz {
        spectrum.mz_array = values;
    } else if is_intensity {
        spectrum.intensity_array = values;
    }
    // Other array kinds (e.g. ion mobility) are ignored.

    Ok(())
}

#[derive(Debug, Default)]
struct BinaryArrayContext {
    cv_params: Vec<CvParam>,
    base64_data: String,
}

/// Iterator adapter over [`MzMLStreamer::next_spectrum`].
pub struct SpectrumIterator<R: BufRead> {
    streamer: MzMLStreamer<R>,
}

impl<R: BufRead> Iterator for SpectrumIterator<R> {
    type Item = Result<MzMLSpectrum, MzMLError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.streamer.next_spectrum() {
            Ok(Some(spectrum)) => Some(Ok(spectrum)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

/// Fetch one attribute of an element by name.
pub(super) fn get_attribute(e: &BytesStart, name: &str) -> Result<Option<String>, MzMLError> {
    for attr in e.attributes() {
        let attr = attr.map_err(|e| MzMLError::Xml(quick_xml::Error::from(e)))?;
        if attr.key.as_ref() == name.as_bytes() {
            return Ok(Some(std::str::from_utf8(&attr.value)?.to_string()));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL_MZML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<mzML xmlns="http://psi.hupo.org/ms/mzml" version="1.1.0">
  <run id="uvpd_run" startTimeStamp="2024-03-18T14:02:11Z">
    <spectrumList count="2">
      <spectrum index="0" id="scan=1" defaultArrayLength="2">
        <cvParam cvRef="MS" accession="MS:1000511" name="ms level" value="2"/>
        <cvParam cvRef="MS" accession="MS:1000130" name="positive scan"/>
        <cvParam cvRef="MS" accession="MS:1000285" name="total ion current" value="125.0"/>
        <scanList count="1">
          <scan>
            <cvParam cvRef="MS" accession="MS:1000016" name="scan start time" value="1.0" unitCvRef="UO" unitAccession="UO:0000031" unitName="minute"/>
          </scan>
        </scanList>
        <binaryDataArrayList count="2">
          <binaryDataArray>
            <cvParam cvRef="MS" accession="MS:1000523" name="64-bit float"/>
            <cvParam cvRef="MS" accession="MS:1000576" name="no compression"/>
            <cvParam cvRef="MS" accession="MS:1000514" name="m/z array"/>
            <binary>AAAAAAAAWUAAAAAAAABpQA==</binary>
          </binaryDataArray>
          <binaryDataArray>
            <cvParam cvRef="MS" accession="MS:1000521" name="32-bit float"/>
            <cvParam cvRef="MS" accession="MS:1000576" name="no compression"/>
            <cvParam cvRef="MS" accession="MS:1000515" name="intensity array"/>
            <binary>AADIQgAASEM=</binary>
          </binaryDataArray>
        </binaryDataArrayList>
      </spectrum>
      <spectrum index="1" id="scan=2" defaultArrayLength="0">
        <cvParam cvRef="MS" accession="MS:1000511" name="ms level" value="2"/>
        <binaryDataArrayList count="2">
          <binaryDataArray>
            <cvParam cvRef="MS" accession="MS:1000523" name="64-bit float"/>
            <cvParam cvRef="MS" accession="MS:1000576" name="no compression"/>
            <cvParam cvRef="MS" accession="MS:1000514" name="m/z array"/>
            <binary></binary>
          </binaryDataArray>
          <binaryDataArray>
            <cvParam cvRef="MS" accession="MS:1000523" name="64-bit float"/>
            <cvParam cvRef="MS" accession="MS:1000576" name="no compression"/>
            <cvParam cvRef="MS" accession="MS:1000515" name="intensity array"/>
            <binary></binary>
          </binaryDataArray>
        </binaryDataArrayList>
      </spectrum>
    </spectrumList>
  </run>
</mzML>"#;

    #[test]
    fn parse_minimal_mzml() {
        let reader = std::io::Cursor::new(MINIMAL_MZML);
        let mut streamer = MzMLStreamer::new(BufReader::new(reader)).unwrap();

        let spectrum = streamer.next_spectrum().unwrap().unwrap();
        assert_eq!(spectrum.index, 0);
        assert_eq!(spectrum.id, "scan=1");
        assert_eq!(spectrum.ms_level, 2);
        assert_eq!(spectrum.polarity, 1);
        assert_eq!(spectrum.total_ion_current, Some(125.0));
        // minutes normalized to seconds
        assert!((spectrum.retention_time.unwrap() - 60.0).abs() < 1e-9);
        assert_eq!(spectrum.mz_array, vec![100.0, 200.0]);
        assert_eq!(spectrum.intensity_array.len(), 2);
        assert!((spectrum.intensity_array[0] - 100.0).abs() < 1e-5);

        assert_eq!(streamer.metadata().run_id.as_deref(), Some("uvpd_run"));
    }

    #[test]
    fn empty_scan_is_valid() {
        let reader = std::io::Cursor::new(MINIMAL_MZML);
        let mut streamer = MzMLStreamer::new(BufReader::new(reader)).unwrap();

        streamer.next_spectrum().unwrap().unwrap();
        let empty = streamer.next_spectrum().unwrap().unwrap();
        assert_eq!(empty.peak_count(), 0);

        assert!(streamer.next_spectrum().unwrap().is_none());
    }

    #[test]
    fn non_self_closing_cv_params_parse_identically() {
        // Some writers emit <cvParam ...></cvParam> instead of the
        // self-closed form; every cvParam in the document must still be
        // applied, the array annotations included.
        let expanded = MINIMAL_MZML.replace("/>", "></cvParam>");
        let reader = std::io::Cursor::new(expanded);
        let mut streamer = MzMLStreamer::new(BufReader::new(reader)).unwrap();

        let spectrum = streamer.next_spectrum().unwrap().unwrap();
        assert_eq!(spectrum.ms_level, 2);
        assert_eq!(spectrum.polarity, 1);
        assert!((spectrum.retention_time.unwrap() - 60.0).abs() < 1e-9);
        assert_eq!(spectrum.mz_array, vec![100.0, 200.0]);
        assert_eq!(spectrum.intensity_array.len(), 2);

        let empty = streamer.next_spectrum().unwrap().unwrap();
        assert_eq!(empty.peak_count(), 0);
    }

    #[test]
    fn spectra_iterator_yields_all() {
        let reader = std::io::Cursor::new(MINIMAL_MZML);
        let streamer = MzMLStreamer::new(BufReader::new(reader)).unwrap();
        let spectra: Result<Vec<_>, _> = streamer.spectra().collect();
        assert_eq!(spectra.unwrap().len(), 2);
    }

    #[test]
    fn malformed_xml_is_an_error() {
        let reader = std::io::Cursor::new("<mzML><run><spectrumList><spectrum id=\"scan=1\">");
        let mut streamer = MzMLStreamer::new(BufReader::new(reader)).unwrap();
        assert!(streamer.next_spectrum().is_err());
    }
}
