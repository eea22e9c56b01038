//! Synthesizes manifest bytes for tests.

use byteorder::{LittleEndian, WriteBytesExt};

use crate::{BaseFractions, CONTAINER_VERSION, IDENTIFIER};

pub fn write_string(buf: &mut Vec<u8>, value: &str) {
    let mut len = value.len();
    loop {
        let group = (len & 0x7F) as u8;
        len >>= 7;
        if len == 0 {
            buf.push(group);
            break;
        }
        buf.push(group | 0x80);
    }
    buf.extend_from_slice(value.as_bytes());
}

fn write_i32(buf: &mut Vec<u8>, value: i32) {
    buf.write_i32::<LittleEndian>(value).unwrap();
}

#[derive(Clone, Debug)]
pub struct ProbeSpec {
    pub version: i32,
    pub name: String,
    pub record_name: Option<String>,
    pub index: i64,
    pub map_info: String,
    pub chromosome: String,
    pub assay_code: u8,
    pub address_a: i32,
    pub address_b: i32,
    pub raw_norm_id: u8,
    pub fractions: BaseFractions,
    pub ref_strand: String,
}
impl ProbeSpec {
    /// A two-color probe at `index` with record version 6.
    pub fn new(name: &str, index: i64) -> Self {
        Self {
            version: 6,
            name: name.to_string(),
            record_name: None,
            index,
            map_info: format!("{}", 10_000 + index),
            chromosome: "1".to_string(),
            assay_code: 0,
            address_a: 1_000 + index as i32,
            address_b: 0,
            raw_norm_id: 0,
            fractions: BaseFractions::default(),
            ref_strand: String::new(),
        }
    }
    pub fn version(mut self, version: i32) -> Self {
        self.version = version;
        self
    }
    pub fn one_color(mut self, assay_code: u8, address_b: i32) -> Self {
        self.assay_code = assay_code;
        self.address_b = address_b;
        self
    }
    pub fn assay(self, assay_code: u8, address_b: i32) -> Self {
        self.one_color(assay_code, address_b)
    }
    pub fn raw_norm_id(mut self, raw: u8) -> Self {
        self.raw_norm_id = raw;
        self
    }
    pub fn map_info(mut self, map_info: &str) -> Self {
        self.map_info = map_info.to_string();
        self
    }
    pub fn chromosome(mut self, chromosome: &str) -> Self {
        self.chromosome = chromosome.to_string();
        self
    }
    /// Name written inside the record, leaving the name table untouched.
    pub fn record_name(mut self, name: &str) -> Self {
        self.record_name = Some(name.to_string());
        self
    }
    pub fn fractions(mut self, fractions: BaseFractions) -> Self {
        self.fractions = fractions;
        self
    }
    pub fn ref_strand(mut self, ref_strand: &str) -> Self {
        self.ref_strand = ref_strand.to_string();
        self
    }

    fn write(&self, buf: &mut Vec<u8>) {
        write_i32(buf, self.version);
        write_string(buf, &format!("{}-0_T_F_1000", self.name));
        write_string(buf, self.record_name.as_deref().unwrap_or(&self.name));
        for _ in 0..3 {
            write_string(buf, "");
        }
        write_i32(buf, (self.index + 1) as i32);
        write_string(buf, "");
        write_string(buf, "TOP");
        write_string(buf, "[A/G]");
        write_string(buf, &self.chromosome);
        write_string(buf, "diploid");
        write_string(buf, "Homo sapiens");
        write_string(buf, &self.map_info);
        write_string(buf, "");
        write_string(buf, "BOT");
        write_i32(buf, self.address_a);
        write_i32(buf, self.address_b);
        write_string(buf, "");
        write_string(buf, "");
        write_string(buf, "37");
        write_string(buf, "dbSNP");
        write_string(buf, "151");
        write_string(buf, "PLUS");
        write_string(buf, "");
        buf.push(0);
        buf.push(3); // expected clusters
        buf.push(0); // intensity only
        buf.push(self.assay_code);
        if self.version >= 7 {
            for value in [
                self.fractions.a,
                self.fractions.c,
                self.fractions.t,
                self.fractions.g,
            ] {
                buf.write_f32::<LittleEndian>(value).unwrap();
            }
        }
        if self.version == 8 {
            write_string(buf, &self.ref_strand);
        }
    }
}

#[derive(Clone, Debug)]
pub struct ManifestBuilder {
    pub identifier: Vec<u8>,
    pub container_version: u8,
    pub inner_version: u32,
    pub manifest_name: String,
    pub control_config: String,
    pub probe_count: Option<i32>,
    pub probes: Vec<ProbeSpec>,
    pub trailer: Vec<u8>,
}
impl Default for ManifestBuilder {
    fn default() -> Self {
        Self::new()
    }
}
impl ManifestBuilder {
    pub fn new() -> Self {
        Self {
            identifier: IDENTIFIER.as_bytes().to_vec(),
            container_version: CONTAINER_VERSION,
            inner_version: 4,
            manifest_name: "TestArray_A1".to_string(),
            control_config: "Staining,1,2".to_string(),
            probe_count: None,
            probes: Vec::new(),
            trailer: Vec::new(),
        }
    }
    pub fn identifier(mut self, identifier: &[u8]) -> Self {
        self.identifier = identifier.to_vec();
        self
    }
    pub fn container_version(mut self, version: u8) -> Self {
        self.container_version = version;
        self
    }
    pub fn inner_version(mut self, version: u32) -> Self {
        self.inner_version = version;
        self
    }
    /// Overrides the probe count written to the header.
    pub fn probe_count(mut self, count: i32) -> Self {
        self.probe_count = Some(count);
        self
    }
    pub fn probe(mut self, probe: ProbeSpec) -> Self {
        self.probes.push(probe);
        self
    }
    /// Bytes appended after the last record.
    pub fn trailer(mut self, trailer: &[u8]) -> Self {
        self.trailer = trailer.to_vec();
        self
    }

    /// Length of everything up to and including the probe count.
    pub fn preamble_len(&self) -> usize {
        let mut buf = Vec::new();
        self.write_preamble(&mut buf);
        buf.len()
    }

    fn write_preamble(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.identifier);
        buf.push(self.container_version);
        buf.write_u32::<LittleEndian>(self.inner_version).unwrap();
        write_string(buf, &self.manifest_name);
        write_string(buf, &self.control_config);
        write_i32(buf, self.count());
    }

    fn count(&self) -> i32 {
        self.probe_count.unwrap_or(self.probes.len() as i32)
    }

    pub fn build(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.write_preamble(&mut buf);

        let count = self.count().max(0) as usize;
        let mut names = vec![String::new(); count];
        let mut raw_ids = vec![0u8; count];
        for probe in &self.probes {
            if probe.index >= 0 && (probe.index as usize) < count {
                names[probe.index as usize] = probe.name.clone();
                raw_ids[probe.index as usize] = probe.raw_norm_id;
            }
        }

        for i in 0..count {
            write_i32(&mut buf, i as i32 + 1);
        }
        for name in &names {
            write_string(&mut buf, name);
        }
        buf.extend_from_slice(&raw_ids);
        for probe in &self.probes {
            probe.write(&mut buf);
        }
        buf.extend_from_slice(&self.trailer);
        buf
    }
}

#[test]
fn test_write_string_prefix() {
    let mut buf = Vec::new();
    write_string(&mut buf, &"x".repeat(300));
    assert_eq!(&buf[..2], &[0xAC, 0x02]);
    assert_eq!(buf.len(), 302);
}
